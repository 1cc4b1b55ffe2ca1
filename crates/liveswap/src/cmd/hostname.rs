use liveswap_client::query_hostname;

use crate::cmd::{parse_duration, HostnameArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_hostname, OutputFormat};

pub fn run(args: HostnameArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let hostname =
        query_hostname(args.addr, timeout).map_err(|err| client_error("query failed", err))?;
    print_hostname(args.addr, &hostname, format);
    Ok(SUCCESS)
}

use std::io::ErrorKind;
use std::sync::atomic::Ordering;
use std::time::Duration;

use liveswap_frame::{FrameConfig, FrameError, FrameReader};
use liveswap_transport::TcpTransport;

use crate::cmd::{parse_duration, stop_on_ctrlc, ListenArgs};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

/// How often a blocked read wakes up to check for Ctrl-C.
const POLL: Duration = Duration::from_millis(250);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let running = stop_on_ctrlc()?;

    let stream = TcpTransport::connect_timeout(args.addr, timeout)
        .map_err(|err| transport_error("connect failed", err))?;
    let config = FrameConfig {
        read_timeout: Some(POLL),
        ..FrameConfig::default()
    };
    let mut reader = FrameReader::with_config_live(stream, config)
        .map_err(|err| frame_error("connect failed", err))?;
    let producer = args.addr.to_string();

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::Io(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                continue
            }
            Err(err) if err.is_disconnect() => break,
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        print_frame(&frame, &producer, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}

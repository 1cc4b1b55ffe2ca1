use std::path::{Path, PathBuf};

use liveswap_server::{
    BroadcastServer, DocumentFilter, DocumentWatcher, ServerConfig, DEFAULT_GENERATION_MARKER,
};
use tracing::info;

use crate::cmd::{parse_duration, stop_on_ctrlc, ServeArgs};
use crate::exit::{io_error, server_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_serving, OutputFormat};

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let write_timeout = parse_duration(&args.write_timeout)?;
    let (root, filter) = watch_target(&args)?;
    let filter_label = describe(&filter);

    let server = BroadcastServer::bind(ServerConfig {
        bind_addr: args.addr,
        write_timeout: Some(write_timeout),
        filter,
        ..ServerConfig::default()
    })
    .map_err(|err| server_error("bind failed", err))?;
    server
        .spawn_accept_loop()
        .map_err(|err| server_error("accept loop failed to start", err))?;

    let watcher =
        DocumentWatcher::watch(&root).map_err(|err| server_error("watch failed", err))?;
    let running = stop_on_ctrlc()?;

    print_serving(server.local_addr(), &root, &filter_label, format);
    watcher
        .run_until(&server, &running)
        .map_err(|err| server_error("broadcast failed", err))?;

    info!(consumers = server.registry().len(), "producer stopped");
    Ok(SUCCESS)
}

/// The directory to watch and the filter to apply to its change events.
fn watch_target(args: &ServeArgs) -> CliResult<(PathBuf, DocumentFilter)> {
    let path = std::fs::canonicalize(&args.path)
        .map_err(|err| io_error(&format!("cannot watch {}", args.path.display()), err))?;

    if path.is_file() {
        if args.marker.is_some() || args.any {
            return Err(CliError::new(
                USAGE,
                "--marker and --any only apply when serving a directory",
            ));
        }
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
        return Ok((dir, DocumentFilter::Exact(path)));
    }

    let filter = if args.any {
        DocumentFilter::Any
    } else {
        let marker = args
            .marker
            .clone()
            .unwrap_or_else(|| DEFAULT_GENERATION_MARKER.to_string());
        if marker.is_empty() {
            return Err(CliError::new(USAGE, "marker must not be empty"));
        }
        DocumentFilter::Marker(marker)
    };
    Ok((path, filter))
}

fn describe(filter: &DocumentFilter) -> String {
    match filter {
        DocumentFilter::Any => "any file".to_string(),
        DocumentFilter::Marker(marker) => format!("extension contains {marker:?}"),
        DocumentFilter::Exact(path) => format!("document {}", path.display()),
    }
}

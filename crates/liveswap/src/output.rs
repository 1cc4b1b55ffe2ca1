use std::io::{IsTerminal, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use liveswap_client::extract_identity;
use liveswap_frame::Frame;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    kind: String,
    kind_code: i32,
    payload_size: usize,
    identity: Option<&'a str>,
    payload: &'a str,
    producer: &'a str,
    timestamp: String,
}

pub fn print_frame(frame: &Frame, producer: &str, format: OutputFormat) {
    let text = frame.text();
    let identity = extract_identity(&text);

    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                kind: frame.kind.to_string(),
                kind_code: frame.kind.as_i32(),
                payload_size: frame.payload.len(),
                identity,
                payload: &text,
                producer,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "SIZE", "IDENTITY", "PRODUCER"])
                .add_row(vec![
                    frame.kind.to_string(),
                    frame.payload.len().to_string(),
                    identity.unwrap_or("-").to_string(),
                    producer.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "kind={} size={} identity={} producer={}",
                frame.kind,
                frame.payload.len(),
                identity.unwrap_or("-"),
                producer
            );
        }
        OutputFormat::Raw => {
            print_raw(frame.payload.as_ref());
        }
    }
}

#[derive(Serialize)]
struct ServingOutput<'a> {
    event: &'static str,
    addr: String,
    root: String,
    filter: &'a str,
}

/// Announce the producer's bound address (port 0 resolves here).
pub fn print_serving(addr: SocketAddr, root: &Path, filter: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ServingOutput {
            event: "serving",
            addr: addr.to_string(),
            root: root.display().to_string(),
            filter,
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("serving {} on {addr} ({filter})", root.display());
        }
        OutputFormat::Raw => println!("{addr}"),
    }
    let _ = std::io::stdout().flush();
}

#[derive(Serialize)]
struct HostnameOutput<'a> {
    addr: String,
    hostname: &'a str,
}

pub fn print_hostname(addr: SocketAddr, hostname: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&HostnameOutput {
            addr: addr.to_string(),
            hostname,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["PRODUCER", "HOSTNAME"])
                .add_row(vec![addr.to_string(), hostname.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("producer={addr} hostname={hostname}"),
        OutputFormat::Raw => println!("{hostname}"),
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

mod config;
mod logging;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use galsniff_core::{
    format_entry, list_ports, ComponentNames, Framer, PortInfo, SerialSource, Sniffer, StreamError,
    TraceLogger,
};
use galsniff_decode::{MessageProcessor, Outcome};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{parse_address, Settings};
use crate::logging::{init_logging, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "galsniff", version, about = "Passive sniffer for the Galaxy alarm-panel bus")]
struct Cli {
    /// JSON configuration file (defaults to the per-user config if present).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a decoded trace of the bus until interrupted.
    Sniff(SniffArgs),
    /// List serial ports.
    Ports,
    /// Decode a single frame given as hex.
    Decode(DecodeArgs),
}

#[derive(Args, Debug)]
struct SniffArgs {
    /// Serial device, e.g. /dev/ttyUSB0.
    port: Option<String>,

    #[arg(long)]
    baud: Option<u32>,

    /// Silence, in microseconds, that ends a frame.
    #[arg(long, value_name = "MICROS", value_parser = clap::value_parser!(u64).range(1..))]
    gap_us: Option<u64>,

    /// Additional recipient address to hide (hex). Repeatable.
    #[arg(long, value_name = "ADDR", value_parser = parse_address)]
    ignore: Vec<u8>,

    /// Drop the configured ignore list.
    #[arg(long)]
    no_ignore: bool,
}

impl SniffArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(port) = &self.port {
            settings.serial.port_name = port.clone();
        }
        if let Some(baud) = self.baud {
            settings.serial.baud_rate = baud;
        }
        if let Some(us) = self.gap_us {
            settings.frame_gap = Duration::from_micros(us);
        }
        if self.no_ignore {
            settings.ignore.clear();
        }
        settings.ignore.extend(self.ignore.iter().copied());
    }
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Frame bytes, e.g. `10 0D 01 C8` or `100D01C8`.
    #[arg(required = true, value_name = "HEX")]
    hex: Vec<String>,

    /// Print the decoded message as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let settings = config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Sniff(args) => sniff(settings, &args),
        Command::Ports => ports(),
        Command::Decode(args) => decode(&settings, &args),
    }
}

fn sniff(mut settings: Settings, args: &SniffArgs) -> Result<()> {
    args.apply(&mut settings);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .context("installing Ctrl-C handler")?;
    }

    let source = SerialSource::open(&settings.serial)
        .with_context(|| format!("opening {}", settings.serial.port_name))?
        .with_stop_flag(stop);

    log::debug!(
        "frame gap {:?}, ignoring {:02X?}",
        settings.frame_gap,
        settings.ignore
    );

    let mut sniffer = Sniffer::new(
        Framer::new(source).with_gap(settings.frame_gap),
        MessageProcessor::new(settings.ignore.iter().copied()),
        TraceLogger::new(std::io::stdout(), ComponentNames::new(settings.components)),
    );

    let result = sniffer.run();
    log::info!("capture stopped: {}", sniffer.stats());

    match result {
        Ok(()) | Err(StreamError::Interrupted) => Ok(()),
        Err(e) => Err(e).context("capture failed"),
    }
}

fn ports() -> Result<()> {
    let ports = list_ports();
    if ports.is_empty() {
        log::warn!("no serial ports found");
    }
    for port in &ports {
        println!("{}", describe_port(port));
    }
    Ok(())
}

fn describe_port(port: &PortInfo) -> String {
    let ids = port
        .usb_ids
        .map(|(vid, pid)| format!(" ({vid:04X}:{pid:04X})"))
        .unwrap_or_default();
    let product = port
        .product
        .as_deref()
        .map(|p| format!(" {p}"))
        .unwrap_or_default();
    format!("{} [{}]{}{}", port.port_name, port.port_type, ids, product)
}

fn parse_frame(parts: &[String]) -> Result<Vec<u8>> {
    let joined: String = parts.concat().chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&joined).with_context(|| format!("invalid hex frame {joined:?}"))
}

fn decode(settings: &Settings, args: &DecodeArgs) -> Result<()> {
    let frame = parse_frame(&args.hex)?;
    let processor = MessageProcessor::new(settings.ignore.iter().copied());

    match processor.process(&frame) {
        Outcome::Message(msg) if args.json => {
            println!("{}", serde_json::to_string_pretty(&msg)?);
        }
        Outcome::Message(msg) => {
            let names = ComponentNames::new(settings.components.clone());
            println!("{}", format_entry(&names.display(msg.recipient), &msg));
        }
        Outcome::Ignored { recipient } => {
            println!("recipient {recipient:02X} is ignored");
        }
        Outcome::Malformed(bytes) => {
            bail!("frame of {} bytes is too short to decode", bytes.len());
        }
    }
    Ok(())
}

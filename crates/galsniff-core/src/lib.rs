//! Core functionalities: bus byte source, framing, trace output, capture loop.

pub mod error;
pub mod framer;
pub mod sniffer;
pub mod source;
pub mod trace;

pub use error::StreamError;
pub use framer::{Framer, DEFAULT_FRAME_GAP};
pub use sniffer::{CaptureStats, Sniffer};
pub use source::{list_ports, ByteSource, PortInfo, SerialConfig, SerialSource};
pub use trace::{format_entry, format_line, ComponentNames, TraceLogger};

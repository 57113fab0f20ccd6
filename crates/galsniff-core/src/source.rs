use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::StreamError;

/// Anything the framer can pull raw bus bytes from.
///
/// Reads must return promptly: `Ok(0)` means nothing was pending, not end of
/// stream. A source that has ended returns [`StreamError::Closed`].
pub trait ByteSource {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        (**self).read_available(buf)
    }
}

/// A serial device as shown by `galsniff ports`.
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: &'static str,
    /// USB vendor and product id.
    pub usb_ids: Option<(u16, u16)>,
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (port_type, usb_ids, product) = match info.port_type {
            SerialPortType::UsbPort(usb) => ("USB", Some((usb.vid, usb.pid)), usb.product),
            SerialPortType::PciPort => ("PCI", None, None),
            SerialPortType::BluetoothPort => ("Bluetooth", None, None),
            SerialPortType::Unknown => ("Unknown", None, None),
        };
        Self {
            port_name: info.port_name,
            port_type,
            usb_ids,
            product,
        }
    }
}

pub fn list_ports() -> Vec<PortInfo> {
    serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect()
}

/// Line settings of the Galaxy bus: 9600 baud, 8N1, no flow control.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    pub flow_control: serialport::FlowControl,
    /// Upper bound on how long a single read may block.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            data_bits: serialport::DataBits::Eight,
            parity: serialport::Parity::None,
            stop_bits: serialport::StopBits::One,
            flow_control: serialport::FlowControl::None,
            read_timeout: Duration::from_millis(1),
        }
    }
}

/// Passive reader on a serial port. Nothing is ever written to the bus.
pub struct SerialSource {
    port: Box<dyn SerialPort>,
    stop: Option<Arc<AtomicBool>>,
}

impl SerialSource {
    pub fn open(cfg: &SerialConfig) -> Result<Self, StreamError> {
        let port = serialport::new(&cfg.port_name, cfg.baud_rate)
            .data_bits(cfg.data_bits)
            .parity(cfg.parity)
            .stop_bits(cfg.stop_bits)
            .flow_control(cfg.flow_control)
            .timeout(cfg.read_timeout)
            .open()?;

        log::info!("listening on {} at {} baud", cfg.port_name, cfg.baud_rate);

        Ok(Self { port, stop: None })
    }

    /// Once `stop` is set, the next read fails with [`StreamError::Interrupted`].
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }
}

impl ByteSource for SerialSource {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if let Some(stop) = &self.stop {
            if stop.load(Ordering::Relaxed) {
                return Err(StreamError::Interrupted);
            }
        }

        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_bus_line_settings() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud_rate, 9600);
        assert_eq!(cfg.data_bits, serialport::DataBits::Eight);
        assert_eq!(cfg.parity, serialport::Parity::None);
        assert_eq!(cfg.stop_bits, serialport::StopBits::One);
        assert_eq!(cfg.flow_control, serialport::FlowControl::None);
    }

    #[test]
    fn list_ports_does_not_panic() {
        for port in list_ports() {
            assert!(!port.port_name.is_empty());
        }
    }

    #[test]
    fn opening_missing_port_fails() {
        let cfg = SerialConfig {
            port_name: "/dev/galsniff-does-not-exist".to_string(),
            ..Default::default()
        };
        assert!(SerialSource::open(&cfg).is_err());
    }
}

//! Frame validation and payload decoding for the Galaxy alarm-panel bus.

pub mod checksum;
pub mod message;
pub mod registry;

pub use checksum::compute_checksum;
pub use message::{MessageProcessor, Outcome, ProcessedMessage, MIN_FRAME_LEN};
pub use registry::Decoder;

/// Space separated, two digit uppercase hex dump.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump_formats_uppercase_pairs() {
        assert_eq!(hex_dump(&[0x0a, 0xff, 0x00]), "0A FF 00");
        assert_eq!(hex_dump(&[]), "");
    }
}

use std::collections::HashSet;

use serde::Serialize;

use crate::checksum::has_valid_checksum;
use crate::hex_dump;
use crate::registry::Decoder;

/// Recipient, command and checksum bytes.
pub const MIN_FRAME_LEN: usize = 3;

/// A validated frame, ready to be written to the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedMessage {
    pub recipient: u8,
    pub command: u8,
    /// Decoder label, or `# XX` when the frame was not decoded.
    pub label: String,
    /// Whether the trailing checksum byte matched.
    pub valid: bool,
    pub rendered: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Message(ProcessedMessage),
    /// Recipient is in the ignore set; nothing was validated or decoded.
    Ignored { recipient: u8 },
    /// Frame too short to hold recipient, command and checksum.
    Malformed(Vec<u8>),
}

/// Splits frames into their fields, checks the checksum and dispatches to
/// the decoder registry.
#[derive(Debug, Clone, Default)]
pub struct MessageProcessor {
    ignored: HashSet<u8>,
}

impl MessageProcessor {
    pub fn new(ignored: impl IntoIterator<Item = u8>) -> Self {
        Self {
            ignored: ignored.into_iter().collect(),
        }
    }

    pub fn is_ignored(&self, recipient: u8) -> bool {
        self.ignored.contains(&recipient)
    }

    pub fn process(&self, frame: &[u8]) -> Outcome {
        if frame.len() < MIN_FRAME_LEN {
            return Outcome::Malformed(frame.to_vec());
        }

        let recipient = frame[0];
        let command = frame[1];
        let payload = &frame[2..frame.len() - 1];

        if self.is_ignored(recipient) {
            return Outcome::Ignored { recipient };
        }

        let valid = has_valid_checksum(frame);

        // A failed checksum means the payload can't be trusted, so it is
        // dumped raw even when a decoder exists.
        let decoded = Decoder::for_command(command)
            .filter(|_| valid)
            .map(|decoder| (decoder.label().to_string(), decoder.decode(payload)));

        let (label, rendered) =
            decoded.unwrap_or_else(|| (format!("# {command:02X}"), hex_dump(&frame[1..])));

        Outcome::Message(ProcessedMessage {
            recipient,
            command,
            label,
            valid,
            rendered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::compute_checksum;
    use pretty_assertions::assert_eq;

    fn frame(recipient: u8, command: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![recipient, command];
        bytes.extend_from_slice(payload);
        bytes.push(compute_checksum(&bytes));
        bytes
    }

    fn message(outcome: Outcome) -> ProcessedMessage {
        match outcome {
            Outcome::Message(message) => message,
            other => panic!("expected a message, got {other:?}"),
        }
    }

    #[test]
    fn decodes_known_command_with_valid_checksum() {
        let processor = MessageProcessor::default();
        let msg = message(processor.process(&frame(0x10, 0x0D, &[0x01])));

        assert_eq!(
            msg,
            ProcessedMessage {
                recipient: 0x10,
                command: 0x0D,
                label: "BKLGHT".to_string(),
                valid: true,
                rendered: "ON".to_string(),
            }
        );
    }

    #[test]
    fn constructed_checksums_always_validate() {
        let processor = MessageProcessor::default();
        let payloads: [&[u8]; 4] = [&[], &[0x00], &[0xFF, 0xFF, 0xFF], &[0x01, 0x80, 0x7F, 0x40]];
        for recipient in [0x00, 0x10, 0x11, 0xFF] {
            for command in [0x00, 0x07, 0x19, 0xC0, 0xFF] {
                for payload in payloads {
                    let msg = message(processor.process(&frame(recipient, command, payload)));
                    assert!(msg.valid, "{recipient:02X} {command:02X} {payload:02X?}");
                }
            }
        }
    }

    #[test]
    fn unknown_command_dumps_command_payload_and_checksum() {
        let processor = MessageProcessor::default();
        let bytes = frame(0x10, 0xFF, &[0x01, 0x02]);
        let msg = message(processor.process(&bytes));

        assert_eq!(msg.label, "# FF");
        assert!(msg.valid);
        assert_eq!(msg.rendered, format!("FF 01 02 {:02X}", bytes[4]));
    }

    #[test]
    fn checksum_mismatch_skips_decoder() {
        let processor = MessageProcessor::default();
        let msg = message(processor.process(&[0x10, 0x0D, 0x01, 0x00]));

        assert!(!msg.valid);
        assert_eq!(msg.label, "# 0D");
        assert_eq!(msg.rendered, "0D 01 00");
    }

    #[test]
    fn ignored_recipient_short_circuits() {
        let processor = MessageProcessor::new([0x90]);
        assert_eq!(
            processor.process(&frame(0x90, 0x19, &[0x00, 0x01])),
            Outcome::Ignored { recipient: 0x90 }
        );
        // bad checksum does not matter for ignored recipients
        assert_eq!(
            processor.process(&[0x90, 0x19, 0x00]),
            Outcome::Ignored { recipient: 0x90 }
        );
    }

    #[test]
    fn short_frames_are_malformed() {
        let processor = MessageProcessor::default();
        assert_eq!(processor.process(&[]), Outcome::Malformed(vec![]));
        assert_eq!(processor.process(&[0x10]), Outcome::Malformed(vec![0x10]));
        assert_eq!(
            processor.process(&[0x10, 0x19]),
            Outcome::Malformed(vec![0x10, 0x19])
        );
    }

    #[test]
    fn minimal_frame_has_empty_payload() {
        let processor = MessageProcessor::default();
        let msg = message(processor.process(&frame(0x11, 0xFE, &[])));

        assert_eq!(msg.label, "OK");
        assert_eq!(msg.rendered, "");
    }

    #[test]
    fn key_press_frame() {
        let processor = MessageProcessor::default();
        let msg = message(processor.process(&frame(0x11, 0xF4, &[0x45])));

        assert_eq!(msg.label, "OK KEY");
        assert_eq!(msg.rendered, "KEY PRESS: 5 TAMPER");
    }
}

use crate::hex_dump;

pub const CMD_INIT: u8 = 0x00;
pub const CMD_DISPLAY_TEXT: u8 = 0x07;
pub const CMD_BACKLIGHT: u8 = 0x0D;
pub const CMD_POLL: u8 = 0x19;
pub const CMD_BAD_CHECKSUM: u8 = 0xF2;
pub const CMD_KEY_PRESS: u8 = 0xF4;
pub const CMD_OK: u8 = 0xFE;

/// Reported in place of a key press when the keypad tamper switch is open.
const TAMPER_CODE: u8 = 0x7F;
const TAMPER_FLAG: u8 = 0x40;
const KEY_MASK: u8 = 0x0F;

const KEYPAD_SYMBOLS: [&str; 16] = [
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "B", "A", "ENT", "ESC", "*", "#",
];

/// Payload decoders, one per known command byte.
///
/// Every decoder is total: any payload, including an empty one, renders to
/// some string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    Init,
    DisplayText,
    Backlight,
    Poll,
    BadChecksum,
    KeyPress,
    Ok,
}

impl Decoder {
    pub fn for_command(command: u8) -> Option<Self> {
        Some(match command {
            CMD_INIT => Self::Init,
            CMD_DISPLAY_TEXT => Self::DisplayText,
            CMD_BACKLIGHT => Self::Backlight,
            CMD_POLL => Self::Poll,
            CMD_BAD_CHECKSUM => Self::BadChecksum,
            CMD_KEY_PRESS => Self::KeyPress,
            CMD_OK => Self::Ok,
            _ => return None,
        })
    }

    /// Display label, at most six characters.
    pub fn label(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::DisplayText => "DISP",
            Self::Backlight => "BKLGHT",
            Self::Poll => "POLL",
            Self::BadChecksum => "BADCHK",
            Self::KeyPress => "OK KEY",
            Self::Ok => "OK",
        }
    }

    pub fn decode(self, payload: &[u8]) -> String {
        match self {
            Self::Init | Self::DisplayText | Self::BadChecksum | Self::Ok => hex_dump(payload),
            Self::Backlight => decode_backlight(payload).to_string(),
            Self::Poll => decode_poll(payload),
            Self::KeyPress => decode_key_press(payload),
        }
    }
}

fn decode_backlight(payload: &[u8]) -> &'static str {
    match payload.first() {
        Some(0x00) => "OFF",
        Some(0x01) => "ON",
        _ => "UNKNOWN BACKLIGHT OPERATION",
    }
}

// Poll frames wrap their sub-payload in one leading and one trailing byte.
fn decode_poll(payload: &[u8]) -> String {
    if payload.len() < 2 {
        return String::new();
    }
    hex_dump(&payload[1..payload.len() - 1])
}

fn decode_key_press(payload: &[u8]) -> String {
    let Some(&op) = payload.first() else {
        return "NO KEY DATA".to_string();
    };

    if op == TAMPER_CODE {
        return "TAMPER".to_string();
    }

    let key = KEYPAD_SYMBOLS[usize::from(op & KEY_MASK)];
    let tamper = if op & TAMPER_FLAG != 0 { " TAMPER" } else { "" };
    format!("KEY PRESS: {key}{tamper}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn required_commands_are_registered() {
        assert_eq!(Decoder::for_command(0x07), Some(Decoder::DisplayText));
        assert_eq!(Decoder::for_command(0x0D), Some(Decoder::Backlight));
        assert_eq!(Decoder::for_command(0x19), Some(Decoder::Poll));
        assert_eq!(Decoder::for_command(0xF4), Some(Decoder::KeyPress));
        assert_eq!(Decoder::for_command(0xFF), None);
        assert_eq!(Decoder::for_command(0xC0), None);
    }

    #[test]
    fn labels_fit_six_columns() {
        for command in 0..=u8::MAX {
            if let Some(decoder) = Decoder::for_command(command) {
                assert!(decoder.label().len() <= 6, "{decoder:?}");
            }
        }
        assert_eq!(Decoder::KeyPress.label(), "OK KEY");
        assert_eq!(Decoder::Backlight.label(), "BKLGHT");
    }

    #[test]
    fn backlight_operations() {
        assert_eq!(Decoder::Backlight.decode(&[0x00]), "OFF");
        assert_eq!(Decoder::Backlight.decode(&[0x01]), "ON");
        assert_eq!(Decoder::Backlight.decode(&[0x02]), "UNKNOWN BACKLIGHT OPERATION");
        assert_eq!(Decoder::Backlight.decode(&[]), "UNKNOWN BACKLIGHT OPERATION");
    }

    #[test]
    fn display_dumps_whole_payload() {
        assert_eq!(Decoder::DisplayText.decode(&[0x17, 0x41, 0x4C]), "17 41 4C");
    }

    #[test]
    fn poll_strips_wrapper_bytes() {
        assert_eq!(Decoder::Poll.decode(&[0x00, 0x12, 0x34, 0x99]), "12 34");
        assert_eq!(Decoder::Poll.decode(&[0x00, 0x99]), "");
        assert_eq!(Decoder::Poll.decode(&[0x00]), "");
    }

    #[test]
    fn tamper_code_overrides_key_bits() {
        assert_eq!(Decoder::KeyPress.decode(&[0x7F]), "TAMPER");
    }

    #[test]
    fn key_press_symbols() {
        assert_eq!(Decoder::KeyPress.decode(&[0x05]), "KEY PRESS: 5");
        assert_eq!(Decoder::KeyPress.decode(&[0x45]), "KEY PRESS: 5 TAMPER");
        assert_eq!(Decoder::KeyPress.decode(&[0x0A]), "KEY PRESS: B");
        assert_eq!(Decoder::KeyPress.decode(&[0x0C]), "KEY PRESS: ENT");
        assert_eq!(Decoder::KeyPress.decode(&[0x0F]), "KEY PRESS: #");
        assert_eq!(Decoder::KeyPress.decode(&[0x4D]), "KEY PRESS: ESC TAMPER");
        assert_eq!(Decoder::KeyPress.decode(&[]), "NO KEY DATA");
    }
}

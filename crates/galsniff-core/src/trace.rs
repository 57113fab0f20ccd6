use chrono::{DateTime, Duration, Utc};
use galsniff_decode::ProcessedMessage;
use std::collections::HashMap;
use std::io::{self, Write};

const MIN_NAME_WIDTH: usize = 7;
const MAX_NAME_WIDTH: usize = 12;
const LABEL_WIDTH: usize = 6;

const VALID_GLYPH: char = '✓';
const INVALID_GLYPH: char = '⨯';

/// Human names for bus addresses, rendered in a fixed width column.
#[derive(Debug, Clone)]
pub struct ComponentNames {
    names: HashMap<u8, String>,
    width: usize,
}

impl ComponentNames {
    pub fn new(names: HashMap<u8, String>) -> Self {
        let longest = names.values().map(|n| n.chars().count()).max().unwrap_or(0);
        // one column of breathing room after the longest name
        let width = (longest + 1).clamp(MIN_NAME_WIDTH, MAX_NAME_WIDTH);
        Self { names, width }
    }

    pub fn lookup(&self, address: u8) -> Option<&str> {
        self.names.get(&address).map(String::as_str)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Name of `address`, or `??? XX`, truncated or padded to [`Self::width`].
    pub fn display(&self, address: u8) -> String {
        let name = match self.lookup(address) {
            Some(name) => name.to_string(),
            None => format!("??? {address:02X}"),
        };
        let truncated: String = name.chars().take(self.width).collect();
        format!("{truncated:<width$}", width = self.width)
    }
}

impl Default for ComponentNames {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

/// Writes one line per processed message, with the time since the previous
/// line.
pub struct TraceLogger<W> {
    out: W,
    names: ComponentNames,
    last_message: DateTime<Utc>,
}

impl<W: Write> TraceLogger<W> {
    pub fn new(out: W, names: ComponentNames) -> Self {
        Self {
            out,
            names,
            last_message: Utc::now(),
        }
    }

    /// Overrides the reference point for the first elapsed time.
    pub fn starting_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_message = at;
        self
    }

    pub fn last_message(&self) -> DateTime<Utc> {
        self.last_message
    }

    pub fn emit(&mut self, msg: &ProcessedMessage) -> io::Result<()> {
        self.emit_at(msg, Utc::now())
    }

    pub fn emit_at(&mut self, msg: &ProcessedMessage, now: DateTime<Utc>) -> io::Result<()> {
        let elapsed = now.signed_duration_since(self.last_message);
        self.last_message = now;

        let line = format_line(now, elapsed, &self.names.display(msg.recipient), msg);
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Trace columns after the timing fields: direction, name, label, validity
/// glyph and rendered payload.
pub fn format_entry(name: &str, msg: &ProcessedMessage) -> String {
    let glyph = if msg.valid { VALID_GLYPH } else { INVALID_GLYPH };
    format!(
        "> {} {:<label_width$} {} {}",
        name,
        msg.label,
        glyph,
        msg.rendered,
        label_width = LABEL_WIDTH,
    )
}

pub fn format_line(now: DateTime<Utc>, elapsed: Duration, name: &str, msg: &ProcessedMessage) -> String {
    format!(
        "{} {:+.6} {}",
        now.format("%H:%M:%S%.6f"),
        seconds(elapsed),
        format_entry(name, msg)
    )
}

fn seconds(d: Duration) -> f64 {
    match d.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => d.num_milliseconds() as f64 / 1_000.0,
    }
}

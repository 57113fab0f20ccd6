//! Timing based frame reconstruction.
//!
//! The bus has no length field and no terminator: a message is whatever
//! arrives back to back, and a silence of at least [`DEFAULT_FRAME_GAP`]
//! separates one message from the next.

use std::time::{Duration, Instant};

use crate::error::StreamError;
use crate::source::ByteSource;

pub const DEFAULT_FRAME_GAP: Duration = Duration::from_millis(5);

/// Pause between empty reads. Small enough to keep gap timing well under a
/// millisecond.
const IDLE_SLEEP: Duration = Duration::from_micros(100);

const READ_CHUNK: usize = 256;

pub struct Framer<S> {
    source: S,
    gap: Duration,
    carry: Vec<u8>,
}

impl<S: ByteSource> Framer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            gap: DEFAULT_FRAME_GAP,
            carry: Vec::new(),
        }
    }

    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap = gap;
        self
    }

    /// Next completed frame, carrying the first bytes of the following frame
    /// over to the next call.
    ///
    /// An empty frame is not an error; it means the previous call ended on a
    /// gap with nothing accumulated (always the case for the very first call
    /// when the bus is quiet).
    pub fn next_frame(&mut self) -> Result<Vec<u8>, StreamError> {
        let carry = std::mem::take(&mut self.carry);
        let (frame, leftover) = self.read_frame(carry)?;
        self.carry = leftover;
        Ok(frame)
    }

    /// Accumulates onto `carry` until a gap, returning the frame and the bytes
    /// that ended it.
    pub fn read_frame(&mut self, carry: Vec<u8>) -> Result<(Vec<u8>, Vec<u8>), StreamError> {
        let mut frame = carry;

        loop {
            let before = Instant::now();
            let data = self.read_some()?;
            let waited = before.elapsed();

            log::trace!("read {:02X?} after {:?}", data, waited);

            if waited >= self.gap {
                return Ok((frame, data));
            }
            frame.extend_from_slice(&data);
        }
    }

    /// Polls the source until at least one byte arrives.
    fn read_some(&mut self) -> Result<Vec<u8>, StreamError> {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = self.source.read_available(&mut buf)?;
            if n > 0 {
                return Ok(buf[..n].to_vec());
            }
            std::thread::sleep(IDLE_SLEEP);
        }
    }
}

use galsniff_decode::{hex_dump, MessageProcessor, Outcome};
use std::fmt;
use std::io::Write;

use crate::error::StreamError;
use crate::framer::Framer;
use crate::source::ByteSource;
use crate::trace::TraceLogger;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames: u64,
    pub empty: u64,
    pub malformed: u64,
    pub ignored: u64,
    pub bad_checksum: u64,
    pub emitted: u64,
}

impl fmt::Display for CaptureStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames, {} emitted, {} bad checksum, {} ignored, {} malformed, {} empty",
            self.frames, self.emitted, self.bad_checksum, self.ignored, self.malformed, self.empty
        )
    }
}

/// Framer, processor and trace logger wired into one capture loop.
pub struct Sniffer<S, W> {
    framer: Framer<S>,
    processor: MessageProcessor,
    logger: TraceLogger<W>,
    stats: CaptureStats,
}

impl<S: ByteSource, W: Write> Sniffer<S, W> {
    pub fn new(framer: Framer<S>, processor: MessageProcessor, logger: TraceLogger<W>) -> Self {
        Self {
            framer,
            processor,
            logger,
            stats: CaptureStats::default(),
        }
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Captures until the source fails. Only stream level failures end the
    /// loop; every per-frame anomaly is absorbed.
    pub fn run(&mut self) -> Result<(), StreamError> {
        loop {
            let frame = self.framer.next_frame()?;
            self.handle_frame(&frame)?;
        }
    }

    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<(), StreamError> {
        if frame.is_empty() {
            self.stats.empty += 1;
            log::debug!("empty frame");
            return Ok(());
        }
        self.stats.frames += 1;

        match self.processor.process(frame) {
            Outcome::Message(msg) => {
                if !msg.valid {
                    self.stats.bad_checksum += 1;
                }
                self.logger.emit(&msg)?;
                self.stats.emitted += 1;
            }
            Outcome::Ignored { recipient } => {
                self.stats.ignored += 1;
                log::debug!("ignored message for {recipient:02X}");
            }
            Outcome::Malformed(bytes) => {
                self.stats.malformed += 1;
                log::warn!("malformed frame ({} bytes): {}", bytes.len(), hex_dump(&bytes));
            }
        }
        Ok(())
    }

    pub fn into_parts(self) -> (Framer<S>, TraceLogger<W>) {
        (self.framer, self.logger)
    }
}

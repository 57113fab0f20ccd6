use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("byte stream closed")]
    Closed,
    #[error("capture interrupted")]
    Interrupted,
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

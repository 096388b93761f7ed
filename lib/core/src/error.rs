use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid rating {0}: expected 1 to 5")]
    InvalidRating(u8),

    #[error("Feedback sink error: {0}")]
    Feedback(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

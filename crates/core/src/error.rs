use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Phase result ordinal {next} does not follow {prev}")]
    OutOfOrderResult { prev: u8, next: u8 },
}

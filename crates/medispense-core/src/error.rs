use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Identifier errors
    #[error("Invalid card identifier: {0}")]
    InvalidCardId(String),

    // Catalog errors
    #[error("Unknown medicine: {0}")]
    UnknownMedicine(String),

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    // Device data errors
    #[error("Invalid stock bitmap: {0}")]
    InvalidStockBitmap(String),

    // Dispenser protocol errors
    #[error("Invalid dispense command: {0}")]
    InvalidDispenseCommand(String),

    #[error("Line too long: {size} bytes (max {max_size})")]
    LineTooLong { size: usize, max_size: usize },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RangeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("frange object index out of range (index {index}, length {len})")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("frange indices must be integers or slices, not {0}")]
    InvalidIndexType(String),

    #[error("frange step must not be zero")]
    ZeroStep,

    #[error("frange bounds and step must be finite")]
    NonFinite,
}

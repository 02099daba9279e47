//! Error taxonomy for maze construction, codes and solving.

use thiserror::Error;

/// Why a maze code could not be decoded (or a maze could not be encoded).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("code must be {expected} characters long, got {actual}")]
    Length { expected: String, actual: usize },

    #[error("invalid character {ch:?} at position {position}")]
    Character { ch: char, position: usize },

    #[error("{field} = {value} is outside the range [{min}, {max}]")]
    Range {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MazeError {
    /// `step` was called after the end cell had been reached.
    #[error("maze is already solved")]
    AlreadySolved,

    #[error("invalid maze code: {0}")]
    InvalidCode(#[from] CodeError),

    #[error("invalid region: {reason}")]
    InvalidRegion { reason: String },

    #[error("unsupported maze dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid endpoints: {reason}")]
    InvalidEndpoints { reason: String },

    #[error("maze was built on an external generator and has no seed")]
    Unseeded,

    #[error("unknown strategy {name:?}")]
    UnknownStrategy { name: String },

    /// A solver ran out of moves before reaching the end.
    #[error("solver has no unexplored paths left")]
    Stuck,
}

pub type Result<T> = std::result::Result<T, MazeError>;

/// Checks that a decoded or to-be-encoded field lies in `[min, max]`.
pub(crate) fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<u64> {
    if value < min || value > max {
        return Err(CodeError::Range {
            field,
            value,
            min,
            max,
        }
        .into());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range_bounds_are_inclusive() {
        assert_eq!(check_range("width", 2, 2, 64), Ok(2));
        assert_eq!(check_range("width", 64, 2, 64), Ok(64));
        assert!(check_range("width", 1, 2, 64).is_err());
        assert!(check_range("width", 65, 2, 64).is_err());
    }

    #[test]
    fn test_range_error_is_descriptive() {
        let err = check_range("yEnd", 70, 0, 63).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid maze code: yEnd = 70 is outside the range [0, 63]"
        );
    }
}

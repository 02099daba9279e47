//! Maze codes: short strings that reproduce a maze.
//!
//! Both formats pack a fixed list of fields into one mixed-radix integer and
//! write it most significant digit first.
//!
//! Compact format (6 characters, base 31, no look-alike glyphs):
//! - seed: 0..=223607
//! - height: 2..=64
//! - width: 2..=64
//!
//! Legacy format (12 letters `A`-`Z`, base 26):
//! - seed: 0..=358276
//! - width, height: 2..=64
//! - start x, start y, end x, end y: inside the grid
//! - travel direction: 0..=3 (east, north, west, south)

use crate::cell::{Coord, Direction};
use crate::error::{check_range, CodeError, MazeError, Result};

const COMPACT_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";
const COMPACT_LENGTH: usize = 6;
pub const COMPACT_MAX_SEED: u64 = 223_607;

const LEGACY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LEGACY_LENGTH: usize = 12;
const LEGACY_MAX_SEED: u64 = 358_276;

pub const MIN_CODE_SIZE: u64 = 2;
pub const MAX_CODE_SIZE: u64 = 64;
/// Radix of a size field.
const SIZE_RADIX: u64 = MAX_CODE_SIZE - MIN_CODE_SIZE + 1;
/// Radix of a coordinate field.
const COORD_RADIX: u64 = MAX_CODE_SIZE;
const DIRECTION_RADIX: u64 = 4;

/// Start, end and travel direction pinned by a legacy code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub start: Coord,
    pub end: Coord,
    pub travel: Direction,
}

/// Everything needed to rebuild a maze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MazeParams {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    /// Explicit endpoints; placed from the seed when absent.
    pub endpoints: Option<Endpoints>,
}

impl MazeParams {
    pub fn new(seed: u64, width: usize, height: usize) -> Self {
        Self {
            seed,
            width,
            height,
            endpoints: None,
        }
    }

    pub fn with_endpoints(mut self, start: Coord, end: Coord, travel: Direction) -> Self {
        self.endpoints = Some(Endpoints { start, end, travel });
        self
    }
}

/// Encodes seed and size as a compact code.
pub fn encode(params: &MazeParams) -> Result<String> {
    let seed = check_range("seed", params.seed, 0, COMPACT_MAX_SEED)?;
    let width = check_range("width", params.width as u64, MIN_CODE_SIZE, MAX_CODE_SIZE)?;
    let height = check_range("height", params.height as u64, MIN_CODE_SIZE, MAX_CODE_SIZE)?;

    let mut value = seed;
    value = value * SIZE_RADIX + (height - MIN_CODE_SIZE);
    value = value * SIZE_RADIX + (width - MIN_CODE_SIZE);

    Ok(write_digits(value, COMPACT_ALPHABET, COMPACT_LENGTH))
}

/// Encodes seed, size and endpoints as a legacy code.
pub fn encode_legacy(params: &MazeParams) -> Result<String> {
    let seed = check_range("seed", params.seed, 0, LEGACY_MAX_SEED)?;
    let width = check_range("width", params.width as u64, MIN_CODE_SIZE, MAX_CODE_SIZE)?;
    let height = check_range("height", params.height as u64, MIN_CODE_SIZE, MAX_CODE_SIZE)?;
    let endpoints = params.endpoints.ok_or_else(|| MazeError::InvalidEndpoints {
        reason: "legacy codes need explicit endpoints".to_string(),
    })?;

    let fields = [
        (seed, 1),
        (width - MIN_CODE_SIZE, SIZE_RADIX),
        (height - MIN_CODE_SIZE, SIZE_RADIX),
        (check_range("xStart", endpoints.start.0 as u64, 0, width - 1)?, COORD_RADIX),
        (check_range("yStart", endpoints.start.1 as u64, 0, height - 1)?, COORD_RADIX),
        (check_range("xEnd", endpoints.end.0 as u64, 0, width - 1)?, COORD_RADIX),
        (check_range("yEnd", endpoints.end.1 as u64, 0, height - 1)?, COORD_RADIX),
        (endpoints.travel.index() as u64, DIRECTION_RADIX),
    ];
    let value = fields
        .iter()
        .fold(0u64, |value, &(field, radix)| value * radix + field);

    Ok(write_digits(value, LEGACY_ALPHABET, LEGACY_LENGTH))
}

/// Decodes either format, chosen by length.
///
/// Lowercase input is accepted. Every field is range checked.
pub fn decode(code: &str) -> Result<MazeParams> {
    let code = code.trim().to_ascii_uppercase();
    match code.chars().count() {
        COMPACT_LENGTH => decode_compact(&code),
        LEGACY_LENGTH => decode_legacy(&code),
        actual => Err(CodeError::Length {
            expected: format!("{} or {}", COMPACT_LENGTH, LEGACY_LENGTH),
            actual,
        }
        .into()),
    }
}

fn decode_compact(code: &str) -> Result<MazeParams> {
    let mut value = read_digits(code, COMPACT_ALPHABET)?;

    let width = value % SIZE_RADIX + MIN_CODE_SIZE;
    value /= SIZE_RADIX;
    let height = value % SIZE_RADIX + MIN_CODE_SIZE;
    value /= SIZE_RADIX;
    let seed = check_range("seed", value, 0, COMPACT_MAX_SEED)?;

    Ok(MazeParams::new(seed, width as usize, height as usize))
}

fn decode_legacy(code: &str) -> Result<MazeParams> {
    let mut value = read_digits(code, LEGACY_ALPHABET)?;
    let mut take = |radix: u64| {
        let digit = value % radix;
        value /= radix;
        digit
    };

    let direction = take(DIRECTION_RADIX);
    let y_end = take(COORD_RADIX);
    let x_end = take(COORD_RADIX);
    let y_start = take(COORD_RADIX);
    let x_start = take(COORD_RADIX);
    let height = take(SIZE_RADIX) + MIN_CODE_SIZE;
    let width = take(SIZE_RADIX) + MIN_CODE_SIZE;
    let seed = value;

    check_range("seed", seed, 0, LEGACY_MAX_SEED)?;
    check_range("xStart", x_start, 0, width - 1)?;
    check_range("yStart", y_start, 0, height - 1)?;
    check_range("xEnd", x_end, 0, width - 1)?;
    check_range("yEnd", y_end, 0, height - 1)?;
    // four directions fill the radix exactly
    let travel = Direction::from_index(direction as usize).unwrap_or(Direction::East);

    Ok(MazeParams::new(seed, width as usize, height as usize).with_endpoints(
        (x_start as usize, y_start as usize),
        (x_end as usize, y_end as usize),
        travel,
    ))
}

fn write_digits(mut value: u64, alphabet: &[u8], length: usize) -> String {
    let radix = alphabet.len() as u64;
    let mut digits = vec![alphabet[0]; length];
    for digit in digits.iter_mut().rev() {
        *digit = alphabet[(value % radix) as usize];
        value /= radix;
    }
    digits.into_iter().map(char::from).collect()
}

fn read_digits(code: &str, alphabet: &[u8]) -> Result<u64> {
    let radix = alphabet.len() as u64;
    code.chars().enumerate().try_fold(0u64, |value, (position, ch)| {
        let digit = u8::try_from(ch)
            .ok()
            .and_then(|byte| alphabet.iter().position(|&symbol| symbol == byte))
            .ok_or(CodeError::Character { ch, position })?;
        Ok(value * radix + digit as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_roundtrip_over_ranges() {
        for &seed in &[0, 1, 77, 100_000, COMPACT_MAX_SEED] {
            for &(width, height) in &[(2, 2), (2, 64), (64, 2), (64, 64), (17, 31)] {
                let params = MazeParams::new(seed, width, height);
                let code = encode(&params).unwrap();
                assert_eq!(code.len(), COMPACT_LENGTH);
                assert_eq!(decode(&code).unwrap(), params, "code {code}");
            }
        }
    }

    #[test]
    fn test_legacy_roundtrip_keeps_endpoints() {
        let params = MazeParams::new(LEGACY_MAX_SEED, 64, 40).with_endpoints(
            (0, 39),
            (63, 0),
            Direction::North,
        );
        let code = encode_legacy(&params).unwrap();
        assert_eq!(code.len(), LEGACY_LENGTH);
        assert!(code.bytes().all(|b| b.is_ascii_uppercase()));
        assert_eq!(decode(&code).unwrap(), params);
    }

    #[test]
    fn test_compact_alphabet_avoids_lookalikes() {
        for ch in ['0', '1', 'I', 'L', 'O'] {
            assert!(!COMPACT_ALPHABET.contains(&(ch as u8)), "{ch}");
        }
        assert_eq!(COMPACT_ALPHABET.len(), 31);
    }

    #[test]
    fn test_smallest_codes() {
        assert_eq!(encode(&MazeParams::new(0, 2, 2)).unwrap(), "222222");
        assert_eq!(decode("222222").unwrap(), MazeParams::new(0, 2, 2));
        assert_eq!(decode("222223").unwrap(), MazeParams::new(0, 3, 2));
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        let code = encode(&MazeParams::new(1234, 20, 10)).unwrap();
        assert_eq!(
            decode(&code.to_ascii_lowercase()).unwrap(),
            MazeParams::new(1234, 20, 10)
        );
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert!(matches!(
            decode("ABCDE"),
            Err(MazeError::InvalidCode(CodeError::Length { actual: 5, .. }))
        ));
        assert!(decode("").is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_characters() {
        assert_eq!(
            decode("22O222"),
            Err(MazeError::InvalidCode(CodeError::Character {
                ch: 'O',
                position: 2
            }))
        );
        assert!(decode("ABCDEFGHIJK1").is_err());
        assert!(decode("22é222").is_err());
    }

    #[test]
    fn test_decode_rejects_out_of_range_seed() {
        // the largest compact value decodes to a seed past the limit
        assert!(matches!(
            decode("ZZZZZZ"),
            Err(MazeError::InvalidCode(CodeError::Range { field: "seed", .. }))
        ));
        assert!(matches!(
            decode("ZZZZZZZZZZZZ"),
            Err(MazeError::InvalidCode(CodeError::Range { field: "seed", .. }))
        ));
    }

    #[test]
    fn test_decode_rejects_end_outside_height() {
        // width 64, height 2 and an end row of 5
        let fields = [
            (0, 1),
            (62, SIZE_RADIX),
            (0, SIZE_RADIX),
            (0, COORD_RADIX),
            (0, COORD_RADIX),
            (3, COORD_RADIX),
            (5, COORD_RADIX),
            (0, DIRECTION_RADIX),
        ];
        let value = fields
            .iter()
            .fold(0u64, |value, &(field, radix)| value * radix + field);
        let code = write_digits(value, LEGACY_ALPHABET, LEGACY_LENGTH);
        assert_eq!(
            decode(&code),
            Err(MazeError::InvalidCode(CodeError::Range {
                field: "yEnd",
                value: 5,
                min: 0,
                max: 1
            }))
        );
    }

    #[test]
    fn test_encode_rejects_out_of_range_fields() {
        assert!(encode(&MazeParams::new(COMPACT_MAX_SEED + 1, 4, 4)).is_err());
        assert!(encode(&MazeParams::new(0, 65, 4)).is_err());
        assert!(encode(&MazeParams::new(0, 4, 1)).is_err());
        assert!(encode_legacy(&MazeParams::new(0, 4, 4)).is_err());
        assert!(encode_legacy(
            &MazeParams::new(0, 4, 4).with_endpoints((0, 0), (0, 4), Direction::South)
        )
        .is_err());
    }
}

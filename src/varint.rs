//! Variable-length integers.
//!
//! Unsigned integers are written little-endian in groups of seven bits; the
//! high bit of each byte is set when more bytes follow. Signed integers are
//! zig-zag mapped onto unsigned ones first (`0, -1, 1, -2, ...` become
//! `0, 1, 2, 3, ...`). Both work on arbitrary precision integers.
//!
//! ```rust
//! use num_bigint::BigInt;
//! use serde_ots::varint::{write_int, write_uint};
//!
//! let mut buf = Vec::new();
//! write_uint(&mut buf, &128u32.into());
//! assert_eq!(buf, vec![0x80, 0x01]);
//!
//! buf.clear();
//! write_int(&mut buf, &BigInt::from(-1));
//! assert_eq!(buf, vec![0x01]);
//! ```

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

const CONTINUATION: u8 = 0b1000_0000;
const GROUP_MASK: u8 = 0b0111_1111;

/// Appends the varint encoding of `n`.
pub fn write_uint(buf: &mut Vec<u8>, n: &BigUint) {
    if n.is_zero() {
        buf.push(0);
        return;
    }
    let groups = n.to_radix_le(128);
    let last = groups.len() - 1;
    buf.extend(
        groups
            .iter()
            .enumerate()
            .map(|(i, &group)| if i < last { group | CONTINUATION } else { group }),
    );
}

/// Appends the zig-zag varint encoding of `n`.
pub fn write_int(buf: &mut Vec<u8>, n: &BigInt) {
    write_uint(buf, &zigzag_encode(n));
}

/// Maps a signed integer onto the unsigned integers.
///
/// `n >= 0` becomes `2n`; `n < 0` becomes `(n << 1) ^ -1`, i.e. `-2n - 1`.
#[must_use]
pub fn zigzag_encode(n: &BigInt) -> BigUint {
    let doubled = n.magnitude() << 1u32;
    match n.sign() {
        Sign::Minus => doubled - BigUint::one(),
        Sign::NoSign | Sign::Plus => doubled,
    }
}

/// Inverse of [`zigzag_encode`]: complement when the low bit is set, then
/// shift right by one.
#[must_use]
pub fn zigzag_decode(u: &BigUint) -> BigInt {
    let half = BigInt::from(u >> 1u32);
    if u.iter_u64_digits().next().unwrap_or(0) & 1 == 1 {
        -half - BigInt::one()
    } else {
        half
    }
}

/// Outcome of reading a varint from a byte slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadUint {
    /// The value and the number of bytes it used.
    Complete { value: BigUint, len: usize, minimal: bool },
    /// The input ended before a byte with the high bit clear.
    Truncated,
}

/// Reads a varint from the start of `input`.
///
/// `minimal` is `false` when the encoding carries redundant trailing zero
/// groups (e.g. `80 00` for zero), which a canonical encoder never emits.
#[must_use]
pub fn read_uint(input: &[u8]) -> ReadUint {
    let end = match input.iter().position(|&byte| byte & CONTINUATION == 0) {
        Some(end) => end,
        None => return ReadUint::Truncated,
    };
    let groups: Vec<u8> = input[..=end].iter().map(|&byte| byte & GROUP_MASK).collect();
    // Every group is below the radix
    let value = BigUint::from_radix_le(&groups, 128).unwrap_or_default();
    ReadUint::Complete {
        value,
        len: end + 1,
        minimal: end == 0 || input[end] != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint_bytes(n: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_uint(&mut buf, &BigUint::from(n));
        buf
    }

    fn int_bytes(n: i64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_int(&mut buf, &BigInt::from(n));
        buf
    }

    #[test]
    fn test_uint_encoding() {
        assert_eq!(uint_bytes(0), vec![0x00]);
        assert_eq!(uint_bytes(1), vec![0x01]);
        assert_eq!(uint_bytes(127), vec![0x7f]);
        assert_eq!(uint_bytes(128), vec![0x80, 0x01]);
        assert_eq!(uint_bytes(300), vec![0xac, 0x02]);
        assert_eq!(uint_bytes(16384), vec![0x80, 0x80, 0x01]);
    }

    #[test]
    fn test_zigzag() {
        assert_eq!(zigzag_encode(&BigInt::from(0)), BigUint::from(0u32));
        assert_eq!(zigzag_encode(&BigInt::from(-1)), BigUint::from(1u32));
        assert_eq!(zigzag_encode(&BigInt::from(1)), BigUint::from(2u32));
        assert_eq!(zigzag_encode(&BigInt::from(-2)), BigUint::from(3u32));
        assert_eq!(int_bytes(-1), vec![0x01]);
        assert_eq!(int_bytes(1), vec![0x02]);
        assert_eq!(int_bytes(-64), vec![0x7f]);
        assert_eq!(int_bytes(64), vec![0x80, 0x01]);

        for n in [-1000i64, -3, -1, 0, 1, 2, 999, i64::MIN, i64::MAX] {
            let big = BigInt::from(n);
            assert_eq!(zigzag_decode(&zigzag_encode(&big)), big);
        }
    }

    #[test]
    fn test_read_uint() {
        assert_eq!(
            read_uint(&[0x80, 0x01, 0xff]),
            ReadUint::Complete {
                value: BigUint::from(128u32),
                len: 2,
                minimal: true
            }
        );
        assert_eq!(read_uint(&[0x80, 0x80]), ReadUint::Truncated);
        assert_eq!(read_uint(&[]), ReadUint::Truncated);
    }

    #[test]
    fn test_non_minimal_detected() {
        match read_uint(&[0x80, 0x00]) {
            ReadUint::Complete { value, minimal, .. } => {
                assert!(value.is_zero());
                assert!(!minimal);
            }
            ReadUint::Truncated => panic!("expected a complete varint"),
        }
    }

    #[test]
    fn test_long_varint() {
        let mut input = vec![0xff; 200_000];
        input.push(0x7f);

        match read_uint(&input) {
            ReadUint::Complete { value, len, minimal } => {
                assert_eq!(len, input.len());
                assert!(minimal);
                assert_eq!(value.bits(), 7 * input.len() as u64);

                let mut buf = Vec::new();
                write_uint(&mut buf, &value);
                assert_eq!(buf, input);
            }
            ReadUint::Truncated => panic!("expected a complete varint"),
        }
    }

    #[test]
    fn test_arbitrary_precision() {
        let huge: BigInt = BigInt::from(1u8) << 200u32;
        let mut buf = Vec::new();
        write_int(&mut buf, &-huge.clone());

        match read_uint(&buf) {
            ReadUint::Complete { value, len, .. } => {
                assert_eq!(len, buf.len());
                assert_eq!(zigzag_decode(&value), -huge);
            }
            ReadUint::Truncated => panic!("expected a complete varint"),
        }
    }
}

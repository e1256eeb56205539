//! The real48 value type: Borland Pascal's 6-byte floating point number.
//!
//! # Layout
//! ```text
//! byte   0        1        2        3        4        5
//!        sfffffff ffffffff ffffffff ffffffff ffffffff eeeeeeee
//! ```
//! s = sign (1 bit), f = mantissa (39 bit), e = exponent (8 bit, bias 129).
//! Order: S-F-E.  An exponent of zero means the whole value is zero,
//! whatever the sign and mantissa bits hold.
//!
//! # Conversions
//! There are three independent ways to get an IEEE-754 value out:
//!   - [`Real48::to_single`] rebuilds a 32-bit pattern (23 of the 39 mantissa
//!     bits survive, the rest are truncated).
//!   - [`Real48::to_double`] rebuilds a 64-bit pattern (all 39 bits survive).
//!   - [`Real48::value`] evaluates the fields arithmetically.  It never
//!     touches a bit pattern, so it serves as an oracle for `to_double`.

use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};
use thiserror::Error;

use crate::method::{DecodeOptions, Method, ReservedExponent};
use crate::pair::PairError;

/// Size of an encoded real48 value in bytes.
pub const REAL48_LEN: usize = 6;
/// Bias of the 8-bit exponent field.
pub const EXPONENT_BIAS: i32 = 129;
/// Exponent value reserved for infinity/overflow in the source format.
pub const RESERVED_EXPONENT: u8 = 0xFF;

const SIGN_MASK: u8 = 0x80;
const SIGN_BYTE: usize = 0;
const EXPONENT_BYTE: usize = 5;

// 129 - 127
const SINGLE_REBIAS: u32 = 2;
// 1023 - 129
const DOUBLE_REBIAS: u64 = 894;
// 52 - 39
const DOUBLE_MANTISSA_SHIFT: u32 = 13;

#[derive(Error, Debug)]
pub enum Real48Error {
    #[error("real48 values are {REAL48_LEN} bytes, got {0}")]
    InvalidLength(usize),
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// Only raised under [`ReservedExponent::Reject`].
    #[error("Exponent {RESERVED_EXPONENT} is reserved for infinite values")]
    ReservedExponent,
    #[error(transparent)]
    Pair(#[from] PairError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A single real48 value in S-F-E byte order.
///
/// Sign and exponent are read from the bytes on every call, so reversing the
/// byte order can never leave a stale field behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Real48([u8; REAL48_LEN]);

impl Real48 {
    pub const fn from_array(bytes: [u8; REAL48_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a value from a byte slice, which must be exactly 6 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Real48Error> {
        <[u8; REAL48_LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_| Real48Error::InvalidLength(bytes.len()))
    }

    pub fn as_bytes(&self) -> &[u8; REAL48_LEN] {
        &self.0
    }

    /// Sign bit: 0 for positive, 1 for negative.
    #[inline]
    pub fn sign(&self) -> u8 {
        (self.0[SIGN_BYTE] & SIGN_MASK) >> 7
    }

    /// Raw biased exponent.
    #[inline]
    pub fn exponent(&self) -> u8 {
        self.0[EXPONENT_BYTE]
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.exponent() == 0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.sign() == 1
    }

    #[inline]
    pub fn has_reserved_exponent(&self) -> bool {
        self.exponent() == RESERVED_EXPONENT
    }

    /// The same bytes end-to-end reversed, as a new value.
    ///
    /// Use this when the source stored the value low byte first (E-F-S).
    pub fn reversed(&self) -> Self {
        let mut bytes = self.0;
        bytes.reverse();
        Self(bytes)
    }

    /// Reverse the byte order in place.  Applying it twice is a no-op.
    pub fn reverse_byte_order(&mut self) {
        self.0.reverse();
        debug!("reversed byte order -> {}", self);
    }

    /// The same value with only the sign bit flipped.
    pub fn with_negated_sign(&self) -> Self {
        let mut bytes = self.0;
        bytes[SIGN_BYTE] ^= SIGN_MASK;
        Self(bytes)
    }

    /// Top 23 mantissa bits: byte 0 (sign masked) and bytes 1-2.
    fn single_mantissa(&self) -> u32 {
        (u32::from(self.0[0] & !SIGN_MASK) << 16) | u32::from(BigEndian::read_u16(&self.0[1..3]))
    }

    /// All 39 mantissa bits: byte 0 (sign masked) and bytes 1-4.
    fn double_mantissa(&self) -> u64 {
        (u64::from(self.0[0] & !SIGN_MASK) << 32) | u64::from(BigEndian::read_u32(&self.0[1..5]))
    }

    /// Convert to IEEE-754 single precision by rebuilding its bit pattern.
    ///
    /// The low 16 mantissa bits are truncated.  Exponents 1 and 2 sit below
    /// the smallest normal single, so those values are narrowed from
    /// [`to_double`](Self::to_double) instead.  At exponent 2 this differs
    /// from plain bit assembly, which would give the subnormal `0.m * 2^-126`.
    pub fn to_single(&self) -> f32 {
        let exp = self.exponent();
        if exp == 0 {
            return 0.0;
        }
        if exp == RESERVED_EXPONENT {
            warn!("exponent {} is reserved, decoding {} as a finite value", exp, self);
        }
        if u32::from(exp) <= SINGLE_REBIAS {
            return self.to_double() as f32;
        }

        let bits = (u32::from(self.sign()) << 31)
            | ((u32::from(exp) - SINGLE_REBIAS) << 23)
            | self.single_mantissa();
        f32::from_bits(bits)
    }

    /// Convert to IEEE-754 double precision by rebuilding its bit pattern.
    ///
    /// The 39 mantissa bits fill the top of the 52-bit field; the low 13
    /// bits are zero, so the conversion is exact.
    pub fn to_double(&self) -> f64 {
        let exp = self.exponent();
        if exp == 0 {
            return 0.0;
        }
        if exp == RESERVED_EXPONENT {
            warn!("exponent {} is reserved, decoding {} as a finite value", exp, self);
        }

        let bits = (u64::from(self.sign()) << 63)
            | ((u64::from(exp) + DOUBLE_REBIAS) << 52)
            | (self.double_mantissa() << DOUBLE_MANTISSA_SHIFT);
        f64::from_bits(bits)
    }

    /// Evaluate the value arithmetically as `±(1 + 2f) * 2^(e - 129)`.
    ///
    /// `f` is the mantissa bytes read as a base-256 fraction, most
    /// significant byte first.  Slower than [`to_double`](Self::to_double)
    /// but independent of it.
    pub fn value(&self) -> f64 {
        let [a0, a1, a2, a3, a4, a5] = self.0;
        if a5 == 0 {
            return 0.0;
        }

        let exp = i32::from(a5) - EXPONENT_BIAS;
        let f = (f64::from(a0 & !SIGN_MASK)
            + (f64::from(a1) + (f64::from(a2) + (f64::from(a3) + f64::from(a4) / 256.0) / 256.0) / 256.0)
                / 256.0)
            / 256.0;
        let mut mantissa = 1.0 + 2.0 * f;
        if self.is_negative() {
            mantissa = -mantissa;
        }
        2f64.powi(exp) * mantissa
    }

    /// Decode according to `opts`, widening single precision results to `f64`.
    ///
    /// Fails only when `opts` rejects the reserved exponent and this value
    /// carries it.
    pub fn decode(&self, opts: &DecodeOptions) -> Result<f64, Real48Error> {
        let r48 = if opts.reverse { self.reversed() } else { *self };
        if r48.has_reserved_exponent() && opts.reserved_exponent == ReservedExponent::Reject {
            return Err(Real48Error::ReservedExponent);
        }

        debug!("decoding {} via {}", r48, opts.method.name());
        Ok(match opts.method {
            Method::Single => f64::from(r48.to_single()),
            Method::Double => r48.to_double(),
            Method::Arithmetic => r48.value(),
        })
    }

    /// Read exactly one value.
    pub fn read<R: Read>(mut reader: R) -> Result<Self, Real48Error> {
        let mut bytes = [0u8; REAL48_LEN];
        reader.read_exact(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.0)
    }
}

impl From<[u8; REAL48_LEN]> for Real48 {
    fn from(bytes: [u8; REAL48_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Real48 {
    type Error = Real48Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

/// Lowercase hex, 12 digits.
impl fmt::Display for Real48 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Parses 12 hex digits, with or without a `0x` prefix.
impl FromStr for Real48 {
    type Err = Real48Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits)?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: Real48 = Real48::from_array([0x00, 0x00, 0x00, 0x00, 0x00, 0x81]);
    // 0.1 rounded to 39 mantissa bits
    const TENTH: Real48 = Real48::from_array([0x4C, 0xCC, 0xCC, 0xCC, 0xCD, 0x7D]);

    #[test]
    fn one_decodes_exactly() {
        assert_eq!(ONE.to_single(), 1.0);
        assert_eq!(ONE.to_double(), 1.0);
        assert_eq!(ONE.value(), 1.0);
    }

    #[test]
    fn small_known_values() {
        let cases: [([u8; 6], f64); 5] = [
            ([0x80, 0, 0, 0, 0, 0x81], -1.0),
            ([0x00, 0, 0, 0, 0, 0x82], 2.0),
            ([0x00, 0, 0, 0, 0, 0x80], 0.5),
            ([0x40, 0, 0, 0, 0, 0x81], 1.5),
            ([0xC0, 0, 0, 0, 0, 0x83], -6.0),
        ];
        for (bytes, expected) in cases {
            let r48 = Real48::from_array(bytes);
            assert_eq!(r48.to_double(), expected, "{r48}");
            assert_eq!(r48.value(), expected, "{r48}");
            assert_eq!(r48.to_single(), expected as f32, "{r48}");
        }
    }

    #[test]
    fn tenth_keeps_double_precision() {
        assert!((TENTH.to_double() - 0.1).abs() < 1e-12);
        assert_eq!(TENTH.to_double(), TENTH.value());
        // 0x3DCCCCCC: the last mantissa bit is truncated, not rounded.
        assert_eq!(TENTH.to_single(), f32::from_bits(0x3DCC_CCCC));
    }

    #[test]
    fn zero_exponent_is_positive_zero() {
        let r48 = Real48::from_array([0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00]);
        assert!(r48.is_zero());
        assert!(r48.to_single().is_sign_positive() && r48.to_single() == 0.0);
        assert!(r48.to_double().is_sign_positive() && r48.to_double() == 0.0);
        assert!(r48.value().is_sign_positive() && r48.value() == 0.0);
    }

    #[test]
    fn reserved_exponent_passes_through() {
        let r48 = Real48::from_array([0, 0, 0, 0, 0, RESERVED_EXPONENT]);
        assert!(r48.has_reserved_exponent());
        assert_eq!(r48.to_double(), 2f64.powi(126));
        assert_eq!(r48.to_single(), f32::from_bits(253 << 23));
        assert_eq!(r48.value(), 2f64.powi(126));
    }

    #[test]
    fn tiny_exponents_become_subnormal_singles() {
        let e1 = Real48::from_array([0, 0, 0, 0, 0, 1]);
        let e2 = Real48::from_array([0, 0, 0, 0, 0, 2]);
        assert_eq!(e1.to_single(), f32::from_bits(1 << 21));
        assert_eq!(e2.to_single(), f32::from_bits(1 << 22));
        assert_eq!(e1.with_negated_sign().to_single(), -f32::from_bits(1 << 21));
        // 1.5 * 2^-127, not the 0.5 * 2^-126 a raw 0x00400000 pattern would mean.
        let e2_half = Real48::from_array([0x40, 0, 0, 0, 0, 2]);
        assert_eq!(e2_half.to_single(), f32::from_bits(3 << 21));
        assert!(e2_half.with_negated_sign().is_negative());
    }

    #[test]
    fn sign_and_exponent_follow_reversal() {
        let original = Real48::from_array([0x01, 0x00, 0x00, 0x00, 0x00, 0x80]);
        let mut r48 = original;
        assert_eq!((r48.sign(), r48.exponent()), (0, 0x80));
        r48.reverse_byte_order();
        assert_eq!(r48.as_bytes(), &[0x80, 0x00, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!((r48.sign(), r48.exponent()), (1, 0x01));
        assert_eq!(r48, original.reversed());
        r48.reverse_byte_order();
        assert_eq!(r48, original);
        assert_eq!((r48.sign(), r48.exponent()), (0, 0x80));
    }

    #[test]
    fn wrong_length_is_rejected() {
        for len in [0usize, 5, 7] {
            let bytes = vec![0u8; len];
            match Real48::from_bytes(&bytes) {
                Err(Real48Error::InvalidLength(n)) => assert_eq!(n, len),
                other => panic!("expected InvalidLength, got {other:?}"),
            }
        }
    }

    #[test]
    fn decode_honours_options() {
        let reserved = Real48::from_array([0, 0, 0, 0, 0, RESERVED_EXPONENT]);
        let strict = DecodeOptions {
            reserved_exponent: ReservedExponent::Reject,
            ..DecodeOptions::default()
        };
        assert!(matches!(reserved.decode(&strict), Err(Real48Error::ReservedExponent)));
        assert!(reserved.decode(&DecodeOptions::default()).is_ok());

        let stored_low_first = Real48::from_array([0x81, 0, 0, 0, 0, 0x40]);
        let opts = DecodeOptions {
            method: Method::Arithmetic,
            reverse: true,
            ..DecodeOptions::default()
        };
        assert_eq!(stored_low_first.decode(&opts).unwrap(), 1.5);
    }

    #[test]
    fn hex_text_form() {
        assert_eq!(TENTH.to_string(), "4ccccccccd7d");
        assert_eq!("0x4CCCCCCCCD7D".parse::<Real48>().unwrap(), TENTH);
        assert!(matches!("0081".parse::<Real48>(), Err(Real48Error::InvalidLength(2))));
        assert!(matches!("zz0000000081".parse::<Real48>(), Err(Real48Error::InvalidHex(_))));
    }

    #[test]
    fn read_write_single_value() {
        let mut buf = Vec::new();
        TENTH.write(&mut buf).unwrap();
        assert_eq!(buf.len(), REAL48_LEN);
        assert_eq!(Real48::read(buf.as_slice()).unwrap(), TENTH);
        assert!(matches!(Real48::read(&buf[..4]), Err(Real48Error::Io(_))));
    }
}

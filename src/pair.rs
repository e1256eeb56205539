//! Reassembly of real48 values that a database stores as two integers.
//!
//! Pervasive SQL (as used by Iris Exchequer) keeps a real48 column as a
//! 2-byte and a 4-byte signed integer.  Writing the 4-byte integer big-endian
//! followed by the 2-byte integer big-endian yields the value in S-F-E order:
//!
//! ```text
//! int4 (BE)                           int2 (BE)
//! [0]      [1]      [2]      [3]      [4]      [5]
//! sfffffff ffffffff ffffffff ffffffff ffffffff eeeeeeee
//! ```
//!
//! The 4-then-2 order is fixed by the column layout and must not change.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;
use thiserror::Error;

use crate::decoder::{Real48, REAL48_LEN};

/// The 2-byte column excludes -32768.
pub const INT2_MIN: i64 = -32767;
pub const INT2_MAX: i64 = 32767;
pub const INT4_MIN: i64 = i32::MIN as i64;
pub const INT4_MAX: i64 = i32::MAX as i64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairError {
    #[error("{field} value {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min:   i64,
        max:   i64,
    },
}

/// A validated (2-byte, 4-byte) integer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IntegerPair {
    int2: i16,
    int4: i32,
}

impl IntegerPair {
    /// Validate both integers against their column ranges.
    pub fn new(int2: i64, int4: i64) -> Result<Self, PairError> {
        Ok(Self {
            int2: checked("int2", int2, INT2_MIN, INT2_MAX)?,
            int4: checked("int4", int4, INT4_MIN, INT4_MAX)?,
        })
    }

    pub fn int2(&self) -> i16 {
        self.int2
    }

    pub fn int4(&self) -> i32 {
        self.int4
    }

    /// Lay the pair out as BE(int4) followed by BE(int2).
    pub fn to_real48(&self) -> Real48 {
        let mut bytes = [0u8; REAL48_LEN];
        BigEndian::write_i32(&mut bytes[..4], self.int4);
        BigEndian::write_i16(&mut bytes[4..], self.int2);
        Real48::from_array(bytes)
    }
}

fn checked<T: TryFrom<i64>>(field: &'static str, value: i64, min: i64, max: i64) -> Result<T, PairError> {
    if (min..=max).contains(&value) {
        if let Ok(v) = T::try_from(value) {
            return Ok(v);
        }
    }
    Err(PairError::OutOfRange { field, value, min, max })
}

/// Combine a 2-byte and a 4-byte integer into a real48 value.
///
/// Fails with [`PairError::OutOfRange`] if either integer is outside its
/// column range; nothing is produced in that case.
pub fn combine(int2: i64, int4: i64) -> Result<Real48, PairError> {
    Ok(IntegerPair::new(int2, int4)?.to_real48())
}

/// Split a real48 value back into the integer pair it would be stored as.
///
/// Values whose trailing two bytes read as -32768 have no valid pair.
pub fn split(r48: &Real48) -> Result<IntegerPair, PairError> {
    let bytes = r48.as_bytes();
    let int4 = BigEndian::read_i32(&bytes[..4]);
    let int2 = BigEndian::read_i16(&bytes[4..]);
    IntegerPair::new(i64::from(int2), i64::from(int4))
}

impl From<IntegerPair> for Real48 {
    fn from(pair: IntegerPair) -> Self {
        pair.to_real48()
    }
}

impl TryFrom<Real48> for IntegerPair {
    type Error = PairError;

    fn try_from(r48: Real48) -> Result<Self, Self::Error> {
        split(&r48)
    }
}

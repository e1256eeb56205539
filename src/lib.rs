pub mod decoder;
pub mod pair;
pub mod method;

pub use decoder::{Real48, Real48Error, REAL48_LEN};
pub use pair::{combine, split, IntegerPair, PairError};
pub use method::{DecodeOptions, Method, ReservedExponent};

//! Conversion strategies and decode configuration.

use serde::Serialize;

/// Which reconstruction path [`Real48::decode`](crate::Real48::decode) takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// 32-bit bit pattern ([`Real48::to_single`](crate::Real48::to_single)).
    Single,
    /// 64-bit bit pattern ([`Real48::to_double`](crate::Real48::to_double)).
    #[default]
    Double,
    /// Arithmetic evaluation ([`Real48::value`](crate::Real48::value)).
    #[serde(rename = "arith")]
    Arithmetic,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::Single, Method::Double, Method::Arithmetic];

    pub fn name(self) -> &'static str {
        match self {
            Method::Single     => "single",
            Method::Double     => "double",
            Method::Arithmetic => "arith",
        }
    }

    /// Parse from a CLI string.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single" | "f32"        => Some(Method::Single),
            "double" | "f64"        => Some(Method::Double),
            "arith" | "arithmetic"  => Some(Method::Arithmetic),
            _                       => None,
        }
    }
}

/// What to do with exponent 255, which the source format reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReservedExponent {
    /// Decode it as an ordinary finite exponent.
    #[default]
    Passthrough,
    /// Fail with [`Real48Error::ReservedExponent`](crate::Real48Error::ReservedExponent).
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    pub method:            Method,
    pub reserved_exponent: ReservedExponent,
    /// Reverse the byte order before decoding (source stored E-F-S).
    pub reverse:           bool,
}

impl DecodeOptions {
    pub fn with_method(method: Method) -> Self {
        Self { method, ..Self::default() }
    }
}

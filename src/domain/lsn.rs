//! Log sequence numbers.
//!
//! [`Lsn`] is a byte offset into the WAL stream. Its text form is two
//! 32-bit upper-case hexadecimal halves joined by `/` (e.g. `0/3000000`),
//! the same form the engine accepts in `recovery_target_lsn`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PitrError;

/// A position in the WAL stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Lsn(u64);

impl Lsn {
    /// Creates an `Lsn` from a raw 64-bit byte offset.
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self(offset)
    }

    /// Builds an `Lsn` from its high and low 32-bit halves.
    #[must_use]
    pub const fn from_parts(high: u32, low: u32) -> Self {
        Self(((high as u64) << 32) | low as u64)
    }

    /// Returns the raw byte offset.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the high 32 bits.
    #[must_use]
    pub const fn high(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns the low 32 bits.
    #[must_use]
    pub const fn low(&self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}/{:X}", self.high(), self.low())
    }
}

impl FromStr for Lsn {
    type Err = PitrError;

    /// Parses `HEX/HEX`. Each half must be 1 to 8 hex digits; case is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PitrError::InvalidLsn(s.to_string());
        let (high, low) = s.trim().split_once('/').ok_or_else(invalid)?;
        let parse_half = |half: &str| {
            if half.is_empty() || half.len() > 8 || !half.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            u32::from_str_radix(half, 16).ok()
        };
        let high = parse_half(high).ok_or_else(invalid)?;
        let low = parse_half(low).ok_or_else(invalid)?;
        Ok(Self::from_parts(high, low))
    }
}

impl Serialize for Lsn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Lsn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_uppercase_halves() {
        assert_eq!(Lsn::new(0x0300_0000).to_string(), "0/3000000");
        assert_eq!(Lsn::from_parts(0x1A, 0xFF00_0000).to_string(), "1A/FF000000");
        assert_eq!(Lsn::default().to_string(), "0/0");
    }

    #[test]
    fn parse_accepts_mixed_case() {
        let Ok(lsn) = "1a/ff000000".parse::<Lsn>() else {
            panic!("valid lsn rejected");
        };
        assert_eq!(lsn.high(), 0x1A);
        assert_eq!(lsn.low(), 0xFF00_0000);
        assert_eq!(lsn.to_string(), "1A/FF000000");
    }

    #[test]
    fn parse_rejects_malformed_text() {
        for bad in ["", "0", "/", "0/", "/1", "0/3000000/1", "g/1", "123456789/0", "0/ 1", "0x1/0"] {
            assert!(bad.parse::<Lsn>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn parse_rejects_shell_metacharacters() {
        assert!("0/1' ; rm -rf /".parse::<Lsn>().is_err());
    }

    #[test]
    fn ordering_follows_offset() {
        assert!(Lsn::from_parts(0, 0xFFFF_FFFF) < Lsn::from_parts(1, 0));
    }

    #[test]
    fn serde_uses_text_form() {
        let lsn = Lsn::new(0x0100_0000);
        let Ok(json) = serde_json::to_string(&lsn) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"0/1000000\"");
        let Ok(back) = serde_json::from_str::<Lsn>(&json) else {
            panic!("deserialization failed");
        };
        assert_eq!(back, lsn);
        assert!(serde_json::from_str::<Lsn>("\"nope\"").is_err());
    }
}

//! Baud rate resolution.
//!
//! Only a fixed set of rates is supported. Requests for any other rate, numeric or textual,
//! resolve to 115200 baud instead of failing.

use std::fmt;
use std::str::FromStr;

use crate::{Error, ErrorKind};

/// A baud rate supported by this crate
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BaudRate {
    /// 19200 baud
    B19200,
    /// 38400 baud
    B38400,
    /// 57600 baud
    B57600,
    /// 115200 baud
    B115200,
    /// 230400 baud
    B230400,
    /// 460800 baud
    B460800,
    /// 500000 baud
    B500000,
    /// 576000 baud
    B576000,
    /// 921600 baud
    B921600,
}

/// A baud rate as requested by a caller, either as number or as decimal text
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BaudRequest<'a> {
    /// A numeric rate like `115200`
    Numeric(u32),
    /// A rate spelled out in decimal like `"115200"`
    Text(&'a str),
}

impl From<u32> for BaudRequest<'_> {
    fn from(rate: u32) -> Self {
        BaudRequest::Numeric(rate)
    }
}

impl<'a> From<&'a str> for BaudRequest<'a> {
    fn from(text: &'a str) -> Self {
        BaudRequest::Text(text)
    }
}

// The one table both numeric and textual lookups go through.
const TABLE: [(BaudRate, u32, &str); 9] = [
    (BaudRate::B19200, 19_200, "19200"),
    (BaudRate::B38400, 38_400, "38400"),
    (BaudRate::B57600, 57_600, "57600"),
    (BaudRate::B115200, 115_200, "115200"),
    (BaudRate::B230400, 230_400, "230400"),
    (BaudRate::B460800, 460_800, "460800"),
    (BaudRate::B500000, 500_000, "500000"),
    (BaudRate::B576000, 576_000, "576000"),
    (BaudRate::B921600, 921_600, "921600"),
];

/// All supported baud rates in ascending order
pub const SUPPORTED_BAUD_RATES: [BaudRate; 9] = [
    BaudRate::B19200,
    BaudRate::B38400,
    BaudRate::B57600,
    BaudRate::B115200,
    BaudRate::B230400,
    BaudRate::B460800,
    BaudRate::B500000,
    BaudRate::B576000,
    BaudRate::B921600,
];

impl BaudRate {
    /// The rate used whenever a request does not match a supported one
    pub const DEFAULT: BaudRate = BaudRate::B115200;

    /// Resolves a numeric rate
    ///
    /// Returns [`BaudRate::DEFAULT`] for every rate outside [`SUPPORTED_BAUD_RATES`].
    pub fn resolve(rate: u32) -> BaudRate {
        TABLE
            .iter()
            .find(|(_, value, _)| *value == rate)
            .map_or(Self::DEFAULT, |(baud, _, _)| *baud)
    }

    /// Resolves a rate given as decimal text
    ///
    /// The text has to be the plain decimal spelling of a supported rate. Anything else, like
    /// surrounding whitespace, a sign or leading zeros, resolves to [`BaudRate::DEFAULT`].
    pub fn resolve_text(text: &str) -> BaudRate {
        TABLE
            .iter()
            .find(|(_, _, spelling)| *spelling == text)
            .map_or(Self::DEFAULT, |(baud, _, _)| *baud)
    }

    /// Resolves either form of request
    pub fn resolve_request(request: BaudRequest<'_>) -> BaudRate {
        match request {
            BaudRequest::Numeric(rate) => Self::resolve(rate),
            BaudRequest::Text(text) => Self::resolve_text(text),
        }
    }

    /// The rate in bits per second
    pub fn as_u32(self) -> u32 {
        self.entry().1
    }

    /// The rate as decimal text
    pub fn as_str(self) -> &'static str {
        self.entry().2
    }

    fn entry(self) -> &'static (BaudRate, u32, &'static str) {
        // Every variant has exactly one table row.
        &TABLE[self as usize]
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<BaudRate> for u32 {
    fn from(baud: BaudRate) -> u32 {
        baud.as_u32()
    }
}

/// Strict parsing which rejects unsupported rates instead of falling back to the default
impl FromStr for BaudRate {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TABLE
            .iter()
            .find(|(_, _, spelling)| *spelling == s)
            .map(|(baud, _, _)| *baud)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidInput,
                    format!("unsupported baud rate: {:?}", s),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn table_rows_follow_variant_order() {
        for (index, (baud, _, _)) in TABLE.iter().enumerate() {
            assert_eq!(*baud as usize, index);
            assert_eq!(SUPPORTED_BAUD_RATES[index], *baud);
        }
    }

    #[test]
    fn numeric_and_text_resolution_agree_on_supported_rates() {
        for baud in SUPPORTED_BAUD_RATES {
            let numeric = BaudRate::resolve(baud.as_u32());
            let text = BaudRate::resolve_text(&baud.as_u32().to_string());
            assert_eq!(numeric, baud);
            assert_eq!(text, baud);
        }
    }

    #[test]
    fn near_misses_fall_back_to_default() {
        assert_eq!(BaudRate::resolve(9600), BaudRate::B115200);
        assert_eq!(BaudRate::resolve(0), BaudRate::B115200);
        assert_eq!(BaudRate::resolve(921_601), BaudRate::B115200);
        assert_eq!(BaudRate::resolve_text(""), BaudRate::B115200);
        assert_eq!(BaudRate::resolve_text("+57600"), BaudRate::B115200);
        assert_eq!(BaudRate::resolve_text(" 57600"), BaudRate::B115200);
        assert_eq!(BaudRate::resolve_text("057600"), BaudRate::B115200);
        assert_eq!(BaudRate::resolve_text("fast"), BaudRate::B115200);
    }

    #[test]
    fn strict_parse_rejects_unsupported_rates() {
        assert_eq!("460800".parse::<BaudRate>(), Ok(BaudRate::B460800));
        let err = "9600".parse::<BaudRate>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[quickcheck]
    fn numeric_and_text_resolution_agree_everywhere(rate: u32) -> bool {
        BaudRate::resolve(rate) == BaudRate::resolve_text(&rate.to_string())
    }

    #[quickcheck]
    fn unsupported_rates_resolve_to_default(rate: u32) -> bool {
        let supported = SUPPORTED_BAUD_RATES.iter().any(|baud| baud.as_u32() == rate);
        supported || BaudRate::resolve(rate) == BaudRate::DEFAULT
    }

    #[quickcheck]
    fn arbitrary_text_resolves_to_a_supported_rate(text: String) -> bool {
        let resolved = BaudRate::resolve_text(&text);
        resolved.as_str() == text || resolved == BaudRate::DEFAULT
    }
}

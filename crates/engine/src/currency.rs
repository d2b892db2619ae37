use serde::{Deserialize, Serialize};

use crate::EngineError;

/// ISO currency code used by a business and all of its money values.
///
/// A business picks its currency once at registration; shops, products,
/// purchases and wallets inherit it.
///
/// ## Minor units
///
/// The engine stores monetary values as an `i64` number of **minor units**
/// (see [`Money`](crate::Money)). Every supported currency uses two fraction
/// digits, so `10.50 GHS` ⇄ `1050`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Ghs,
    Ngn,
    Kes,
    Zar,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Ghs => "GHS",
            Currency::Ngn => "NGN",
            Currency::Kes => "KES",
            Currency::Zar => "ZAR",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        2
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "GHS" => Ok(Currency::Ghs),
            "NGN" => Ok(Currency::Ngn),
            "KES" => Ok(Currency::Kes),
            "ZAR" => Ok(Currency::Zar),
            other => Err(EngineError::InvalidInput(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!(Currency::try_from(" ghs ").unwrap(), Currency::Ghs);
        assert_eq!(Currency::try_from("KES").unwrap(), Currency::Kes);
        assert!(matches!(
            Currency::try_from("XXX"),
            Err(EngineError::InvalidInput(_))
        ));
    }
}

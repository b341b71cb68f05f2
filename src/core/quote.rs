//! Metal and currency selections

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Sentinel currency code for a user-supplied exchange rate.
pub const CUSTOM_CURRENCY: &str = "CUSTOM";

/// Base currency of every upstream quote.
pub const BASE_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetalType {
    #[default]
    Gold,
    Silver,
}

impl MetalType {
    /// Spot market symbol used by the metal price endpoint.
    pub fn symbol(&self) -> &'static str {
        match self {
            MetalType::Gold => "XAU",
            MetalType::Silver => "XAG",
        }
    }

    /// Cache key for this metal's price.
    pub fn cache_key(&self) -> &'static str {
        match self {
            MetalType::Gold => "gold",
            MetalType::Silver => "silver",
        }
    }
}

impl Display for MetalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cache_key())
    }
}

impl FromStr for MetalType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gold" | "xau" => Ok(MetalType::Gold),
            "silver" | "xag" => Ok(MetalType::Silver),
            _ => Err(anyhow::anyhow!("Invalid metal type: {}", s)),
        }
    }
}

/// Selected currency: an ISO code or the custom-rate sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    Code(String),
    Custom,
}

impl Currency {
    pub fn usd() -> Self {
        Currency::Code(BASE_CURRENCY.to_string())
    }

    pub fn is_usd(&self) -> bool {
        matches!(self, Currency::Code(code) if code == BASE_CURRENCY)
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Currency::Custom)
    }

    pub fn code(&self) -> &str {
        match self {
            Currency::Code(code) => code,
            Currency::Custom => CUSTOM_CURRENCY,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::usd()
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        if code == CUSTOM_CURRENCY {
            return Ok(Currency::Custom);
        }
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(anyhow::anyhow!("Invalid currency code: {}", s));
        }
        Ok(Currency::Code(code))
    }
}

impl TryFrom<String> for Currency {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_string()
    }
}

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Upstream provider family an indicator is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Daily market prices (Yahoo Finance).
    MarketData,
    /// Statistical series (Banco Central do Brasil SGS).
    CentralBank,
}

impl SourceKind {
    pub const ALL: [Self; 2] = [Self::MarketData, Self::CentralBank];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MarketData => "yahoo",
            Self::CentralBank => "bcb",
        }
    }

    /// Human-readable provider name for display.
    pub const fn provider_label(self) -> &'static str {
        match self {
            Self::MarketData => "Yahoo Finance",
            Self::CentralBank => "Banco Central do Brasil",
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yahoo" | "yf" | "market_data" => Ok(Self::MarketData),
            "bcb" | "sgs" | "central_bank" => Ok(Self::CentralBank),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

//! Static catalog of known indicators.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::{SourceKind, ValidationError};

/// Identifier understood only by the adapter for the matching [`SourceKind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ProviderCode {
    /// Market ticker, e.g. `^BVSP`.
    Ticker(String),
    /// Numeric SGS series code, e.g. `4189`.
    SeriesCode(u32),
}

impl Display for ProviderCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ticker(symbol) => f.write_str(symbol),
            Self::SeriesCode(code) => write!(f, "{code}"),
        }
    }
}

/// Immutable description of one indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorDefinition {
    pub name: String,
    pub source_kind: SourceKind,
    pub provider_code: ProviderCode,
    pub unit: String,
}

impl IndicatorDefinition {
    pub fn market(name: impl Into<String>, ticker: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_kind: SourceKind::MarketData,
            provider_code: ProviderCode::Ticker(ticker.into()),
            unit: unit.into(),
        }
    }

    pub fn central_bank(name: impl Into<String>, code: u32, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_kind: SourceKind::CentralBank,
            provider_code: ProviderCode::SeriesCode(code),
            unit: unit.into(),
        }
    }
}

/// Name-keyed indicator registry preserving registration order.
#[derive(Debug, Clone)]
pub struct IndicatorRegistry {
    definitions: Vec<IndicatorDefinition>,
    index: HashMap<String, usize>,
}

impl IndicatorRegistry {
    pub fn new(definitions: Vec<IndicatorDefinition>) -> Result<Self, ValidationError> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (position, definition) in definitions.iter().enumerate() {
            if definition.name.trim().is_empty() {
                return Err(ValidationError::EmptyIndicatorName);
            }
            if index.insert(definition.name.clone(), position).is_some() {
                return Err(ValidationError::DuplicateIndicator {
                    name: definition.name.clone(),
                });
            }
        }
        Ok(Self { definitions, index })
    }

    pub fn get(&self, name: &str) -> Option<&IndicatorDefinition> {
        self.index.get(name).map(|&position| &self.definitions[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorDefinition> {
        self.definitions.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|definition| definition.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for IndicatorRegistry {
    /// Brazilian macro dashboard set.
    fn default() -> Self {
        let definitions = vec![
            IndicatorDefinition::market("Ibovespa", "^BVSP", "Pontos"),
            IndicatorDefinition::central_bank("PIB Total", 4380, "R$ milhões"),
            IndicatorDefinition::central_bank("Taxa Selic", 4189, "% ao ano"),
            IndicatorDefinition::central_bank("IPCA Mensal", 433, "%"),
            IndicatorDefinition::central_bank("Câmbio USD/BRL", 3696, "R$"),
            IndicatorDefinition::central_bank("Taxa de Desemprego", 24369, "%"),
        ];
        let index = definitions
            .iter()
            .enumerate()
            .map(|(position, definition)| (definition.name.clone(), position))
            .collect();
        Self { definitions, index }
    }
}

//! Instrument metadata registry
//!
//! Loaded once at startup from the venue's symbol dump and passed around by
//! reference; read-only thereafter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Static per-instrument metadata from the venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    /// Venue symbol (e.g., "XAUUSD")
    #[serde(rename = "Symbol")]
    pub symbol: String,
    /// Decimal places for display/order rounding
    #[serde(rename = "Precision")]
    pub display_precision: u32,
    /// Price value of one pip (e.g., 0.01 for XAUUSD)
    #[serde(rename = "PipLocation")]
    pub pip_location: Decimal,
    /// Order size increment
    #[serde(rename = "TradeAmountStep")]
    pub size_step: Decimal,
    /// Minimum order size
    #[serde(rename = "MinTradeAmount")]
    pub min_size: Decimal,
    /// Maximum order size
    #[serde(rename = "MaxTradeAmount")]
    pub max_size: Decimal,
}

/// Read-only collection of instruments, keyed by symbol
#[derive(Debug, Clone, Default)]
pub struct InstrumentRegistry {
    instruments: HashMap<String, Instrument>,
}

impl InstrumentRegistry {
    /// Build a registry from a list of instruments
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self {
            instruments: instruments
                .into_iter()
                .map(|i| (i.symbol.clone(), i))
                .collect(),
        }
    }

    /// Load the registry from a JSON file (venue symbol dump)
    ///
    /// A missing or empty file is a startup error: nothing downstream can
    /// size or round orders without metadata.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let instruments: HashMap<String, Instrument> = serde_json::from_str(&content)?;
        if instruments.is_empty() {
            anyhow::bail!(
                "no instruments in {}",
                path.as_ref().display()
            );
        }
        tracing::info!(count = instruments.len(), "Loaded instrument registry");
        Ok(Self { instruments })
    }

    /// Look up an instrument by symbol
    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.get(symbol)
    }

    /// All known symbols
    pub fn symbols(&self) -> Vec<String> {
        self.instruments.keys().cloned().collect()
    }

    /// Iterate all instruments
    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }

    /// Number of instruments
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    pub(crate) fn xauusd() -> Instrument {
        Instrument {
            symbol: "XAUUSD".to_string(),
            display_precision: 2,
            pip_location: dec!(0.01),
            size_step: dec!(1),
            min_size: dec!(1),
            max_size: dec!(100),
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = InstrumentRegistry::new(vec![xauusd()]);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("XAUUSD").is_some());
        assert!(registry.get("EURUSD").is_none());
    }

    #[test]
    fn test_registry_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "XAUUSD": {{
                    "Symbol": "XAUUSD",
                    "Precision": 2,
                    "PipLocation": 0.01,
                    "TradeAmountStep": 1,
                    "MinTradeAmount": 1,
                    "MaxTradeAmount": 100
                }}
            }}"#
        )
        .unwrap();

        let registry = InstrumentRegistry::load(file.path()).unwrap();
        let instrument = registry.get("XAUUSD").unwrap();
        assert_eq!(instrument.display_precision, 2);
        assert_eq!(instrument.pip_location, dec!(0.01));
    }

    #[test]
    fn test_registry_load_missing_file() {
        assert!(InstrumentRegistry::load("/nonexistent/instruments.json").is_err());
    }

    #[test]
    fn test_registry_load_empty_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();
        assert!(InstrumentRegistry::load(file.path()).is_err());
    }

    #[test]
    fn test_registry_symbols() {
        let registry = InstrumentRegistry::new(vec![xauusd()]);
        assert_eq!(registry.symbols(), vec!["XAUUSD".to_string()]);
    }
}

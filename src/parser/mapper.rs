//! Broker symbol mapping.
//!
//! After parsing, the working symbol is translated to what the destination
//! trading account actually quotes: an alias table collapses provider
//! spellings (many to one), then a broker prefix/suffix is attached unless
//! the symbol opted out, and finally the allow/deny lists get a veto.

use std::collections::{HashMap, HashSet};

use crate::domain::ParsedSignal;
use crate::error::MappingError;

/// Configurable symbol translation applied before delivery.
#[derive(Debug, Clone, Default)]
pub struct SymbolMapper {
    aliases: HashMap<String, String>,
    prefix: String,
    suffix: String,
    skip_prefix_suffix: HashSet<String>,
    excluded: HashSet<String>,
    allowed: HashSet<String>,
}

impl SymbolMapper {
    /// Build a mapper. All inputs are upper-cased so lookups are
    /// case-insensitive against parser output.
    pub fn new(
        aliases: HashMap<String, String>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        skip_prefix_suffix: impl IntoIterator<Item = String>,
        excluded: impl IntoIterator<Item = String>,
        allowed: impl IntoIterator<Item = String>,
    ) -> Self {
        let upper_set = |items: &mut dyn Iterator<Item = String>| -> HashSet<String> {
            items.map(|s| s.to_uppercase()).collect()
        };
        Self {
            aliases: aliases
                .into_iter()
                .map(|(k, v)| (k.to_uppercase(), v.to_uppercase()))
                .collect(),
            prefix: prefix.into(),
            suffix: suffix.into(),
            skip_prefix_suffix: upper_set(&mut skip_prefix_suffix.into_iter()),
            excluded: upper_set(&mut excluded.into_iter()),
            allowed: upper_set(&mut allowed.into_iter()),
        }
    }

    /// Resolve the final symbol on a parsed signal.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Excluded`] when the symbol is deny-listed and
    /// [`MappingError::NotAllowed`] when an allow-list exists and contains
    /// neither the original nor the mapped symbol.
    pub fn apply(&self, signal: &mut ParsedSignal) -> Result<(), MappingError> {
        if let Some(mapped) = self.aliases.get(&signal.symbol) {
            signal.symbol = mapped.clone();
        }

        let final_symbol = if self.skip_prefix_suffix.contains(&signal.symbol) {
            signal.symbol.clone()
        } else {
            format!("{}{}{}", self.prefix, signal.symbol, self.suffix)
        };

        if self.excluded.contains(&final_symbol.to_uppercase())
            || self.excluded.contains(&signal.symbol)
            || self.excluded.contains(&signal.original_symbol)
        {
            return Err(MappingError::Excluded {
                symbol: signal.original_symbol.clone(),
            });
        }

        if !self.allowed.is_empty()
            && !self.allowed.contains(&final_symbol.to_uppercase())
            && !self.allowed.contains(&signal.symbol)
            && !self.allowed.contains(&signal.original_symbol)
        {
            return Err(MappingError::NotAllowed {
                symbol: signal.original_symbol.clone(),
            });
        }

        signal.final_symbol = final_symbol;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;

    fn mapper(prefix: &str, suffix: &str) -> SymbolMapper {
        SymbolMapper::new(
            HashMap::from([("GOLD".to_string(), "XAUUSD".to_string())]),
            prefix,
            suffix,
            ["BTCUSD".to_string()],
            ["USDTRY".to_string()],
            [],
        )
    }

    #[test]
    fn applies_prefix_and_suffix() {
        let mut signal = ParsedSignal::new("EURUSD", Direction::Buy);
        mapper("", ".m").apply(&mut signal).unwrap();
        assert_eq!(signal.final_symbol, "EURUSD.m");
    }

    #[test]
    fn alias_maps_before_affixing() {
        let mut signal = ParsedSignal::new("GOLD", Direction::Buy);
        mapper("", ".m").apply(&mut signal).unwrap();
        assert_eq!(signal.symbol, "XAUUSD");
        assert_eq!(signal.final_symbol, "XAUUSD.m");
    }

    #[test]
    fn skip_set_bypasses_affixes() {
        let mut signal = ParsedSignal::new("BTCUSD", Direction::Sell);
        mapper("pre.", ".m").apply(&mut signal).unwrap();
        assert_eq!(signal.final_symbol, "BTCUSD");
    }

    #[test]
    fn excluded_symbol_is_rejected() {
        let mut signal = ParsedSignal::new("USDTRY", Direction::Buy);
        let err = mapper("", "").apply(&mut signal).unwrap_err();
        assert!(matches!(err, MappingError::Excluded { .. }));
    }

    #[test]
    fn allow_list_rejects_outsiders() {
        let strict = SymbolMapper::new(
            HashMap::new(),
            "",
            "",
            [],
            [],
            ["EURUSD".to_string(), "GBPUSD".to_string()],
        );

        let mut inside = ParsedSignal::new("EURUSD", Direction::Buy);
        assert!(strict.apply(&mut inside).is_ok());

        let mut outside = ParsedSignal::new("USDJPY", Direction::Buy);
        assert!(matches!(
            strict.apply(&mut outside),
            Err(MappingError::NotAllowed { .. })
        ));
    }

    #[test]
    fn empty_mapper_passes_symbol_through() {
        let mut signal = ParsedSignal::new("NAS100", Direction::Sell);
        SymbolMapper::default().apply(&mut signal).unwrap();
        assert_eq!(signal.final_symbol, "NAS100");
    }
}

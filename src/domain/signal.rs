//! Parsed trading-signal types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// Map a direction keyword (or synonym) to a direction.
    ///
    /// Recognizes the synonyms signal providers commonly use: LONG, BULLISH,
    /// UP and CALL all mean buy; SHORT, BEARISH, DOWN and PUT mean sell.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "BUY" | "LONG" | "BULLISH" | "UP" | "CALL" => Some(Self::Buy),
            "SELL" | "SHORT" | "BEARISH" | "DOWN" | "PUT" => Some(Self::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        };
        write!(f, "{s}")
    }
}

/// How the order should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Execute at the current market price.
    #[default]
    Market,
    /// Pending order at a better-than-market price.
    Limit,
    /// Pending order at a worse-than-market price (breakout entry).
    Stop,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
            Self::Stop => "STOP",
        };
        write!(f, "{s}")
    }
}

/// A structured order instruction extracted from free-form message text.
///
/// A parsed signal is a deterministic function of the message text: the same
/// input always produces the same signal. `symbol` is the normalized working
/// symbol, `original_symbol` preserves what the message actually said, and
/// `final_symbol` is set by the symbol mapper (alias table plus broker
/// prefix/suffix) before delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSignal {
    pub symbol: String,
    pub original_symbol: String,
    pub final_symbol: String,
    pub direction: Direction,
    pub order_type: OrderType,
    pub entry: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit_1: Option<Decimal>,
    pub take_profit_2: Option<Decimal>,
    pub take_profit_3: Option<Decimal>,
}

impl ParsedSignal {
    /// Create a signal with just symbol and direction; price fields are
    /// filled by the price extraction pass.
    pub fn new(symbol: impl Into<String>, direction: Direction) -> Self {
        let symbol = symbol.into();
        Self {
            original_symbol: symbol.clone(),
            symbol,
            final_symbol: String::new(),
            direction,
            order_type: OrderType::Market,
            entry: None,
            stop_loss: None,
            take_profit_1: None,
            take_profit_2: None,
            take_profit_3: None,
        }
    }

    /// Short human-readable description, e.g. "BUY EURUSD" or
    /// "SELL LIMIT GBPUSD".
    #[must_use]
    pub fn describe(&self) -> String {
        match self.order_type {
            OrderType::Market => format!("{} {}", self.direction, self.symbol),
            other => format!("{} {} {}", self.direction, other, self.symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_from_synonyms() {
        assert_eq!(Direction::from_keyword("LONG"), Some(Direction::Buy));
        assert_eq!(Direction::from_keyword("BEARISH"), Some(Direction::Sell));
        assert_eq!(Direction::from_keyword("HOLD"), None);
    }

    #[test]
    fn direction_display_uppercase() {
        assert_eq!(Direction::Buy.to_string(), "BUY");
        assert_eq!(Direction::Sell.to_string(), "SELL");
    }

    #[test]
    fn order_type_defaults_to_market() {
        assert_eq!(OrderType::default(), OrderType::Market);
    }

    #[test]
    fn describe_includes_pending_type() {
        let mut signal = ParsedSignal::new("EURUSD", Direction::Buy);
        assert_eq!(signal.describe(), "BUY EURUSD");

        signal.order_type = OrderType::Limit;
        assert_eq!(signal.describe(), "BUY LIMIT EURUSD");
    }

    #[test]
    fn new_preserves_original_symbol() {
        let signal = ParsedSignal::new("GOLD", Direction::Sell);
        assert_eq!(signal.original_symbol, "GOLD");
        assert_eq!(signal.symbol, "GOLD");
        assert!(signal.final_symbol.is_empty());
    }
}

//! Heuristic text-to-signal parser.
//!
//! The parser is tuned to the phrasings real signal providers use, not a
//! general NLP pass: normalize the text, try an ordered list of format
//! extractors until one claims it, complete missing price fields, infer the
//! order type, normalize and map the symbol, then gate on an economic
//! sanity check.

mod extract;
pub mod mapper;
mod prices;
mod symbols;
mod text;

pub use mapper::SymbolMapper;

use crate::domain::{Direction, ParsedSignal};
use crate::error::MappingError;

/// What the parser concluded about one message.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// A validated signal, symbol fully mapped.
    Signal(ParsedSignal),
    /// Nothing in the text resembled a trading instruction.
    NoSignal,
    /// A pattern matched but the result failed validation.
    Invalid(&'static str),
}

/// Deterministic message-to-signal parser.
///
/// Parsing itself never fails; unrecognizable or inconsistent input becomes
/// a [`ParseOutcome`] variant. Only symbol-mapping vetoes surface as errors
/// so the caller can record exactly what was blocked.
#[derive(Debug, Clone, Default)]
pub struct SignalParser {
    mapper: SymbolMapper,
}

impl SignalParser {
    /// Create a parser with the given symbol mapper.
    #[must_use]
    pub fn new(mapper: SymbolMapper) -> Self {
        Self { mapper }
    }

    /// Parse one raw message.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when the extracted symbol is rejected by the
    /// configured exclusion or allow-list.
    pub fn parse(&self, input: &str) -> Result<ParseOutcome, MappingError> {
        if input.trim().is_empty() {
            return Ok(ParseOutcome::NoSignal);
        }

        let normalized = text::normalize(input);
        let Some(mut signal) = extract::extract(&normalized) else {
            return Ok(ParseOutcome::NoSignal);
        };

        prices::extract_prices(&normalized, &mut signal);
        prices::infer_order_type(&normalized, &mut signal);

        signal.symbol = symbols::normalize_symbol(&signal.symbol);
        correct_inverted_stops(&mut signal);

        self.mapper.apply(&mut signal)?;

        match validate(&signal) {
            None => Ok(ParseOutcome::Signal(signal)),
            Some(reason) => Ok(ParseOutcome::Invalid(reason)),
        }
    }
}

/// Best-effort fix for providers who list stop and target the wrong way
/// around: a single swap when the pair is inverted for the direction.
/// Deliberately not full validation; see the gate below.
fn correct_inverted_stops(signal: &mut ParsedSignal) {
    let (Some(stop), Some(target)) = (signal.stop_loss, signal.take_profit_1) else {
        return;
    };
    let inverted = match signal.direction {
        Direction::Buy => stop > target,
        Direction::Sell => stop < target,
    };
    if inverted {
        signal.stop_loss = Some(target);
        signal.take_profit_1 = Some(stop);
    }
}

/// Hard validation gate: required fields present and, when both stop and
/// first target exist, their ordering economically consistent with the
/// direction.
fn validate(signal: &ParsedSignal) -> Option<&'static str> {
    if signal.symbol.is_empty() {
        return Some("missing symbol");
    }
    if signal.final_symbol.is_empty() {
        return Some("missing mapped symbol");
    }
    if let (Some(stop), Some(target)) = (signal.stop_loss, signal.take_profit_1) {
        match signal.direction {
            Direction::Buy if stop >= target => return Some("buy stop loss at or above target"),
            Direction::Sell if stop <= target => return Some("sell stop loss at or below target"),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderType;
    use rust_decimal_macros::dec;

    fn parse(input: &str) -> ParseOutcome {
        SignalParser::default().parse(input).unwrap()
    }

    fn expect_signal(input: &str) -> ParsedSignal {
        match parse(input) {
            ParseOutcome::Signal(signal) => signal,
            other => panic!("expected signal for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn full_buy_signal_with_three_targets() {
        let signal = expect_signal("BUY EURUSD SL: 1.0860 TP1: 1.0920 TP2: 1.0950 TP3: 1.0980");
        assert_eq!(signal.symbol, "EURUSD");
        assert_eq!(signal.direction, Direction::Buy);
        assert_eq!(signal.stop_loss, Some(dec!(1.0860)));
        assert_eq!(signal.take_profit_1, Some(dec!(1.0920)));
        assert_eq!(signal.take_profit_2, Some(dec!(1.0950)));
        assert_eq!(signal.take_profit_3, Some(dec!(1.0980)));
        assert_eq!(signal.order_type, OrderType::Market);
    }

    #[test]
    fn multiline_sell_signal_stays_consistent() {
        let signal = expect_signal("SELL GBPUSD NOW\nStop Loss: 1.2650\nTake Profit 1: 1.2600");
        assert_eq!(signal.symbol, "GBPUSD");
        assert_eq!(signal.direction, Direction::Sell);
        assert_eq!(signal.stop_loss, Some(dec!(1.2650)));
        assert_eq!(signal.take_profit_1, Some(dec!(1.2600)));
        assert_eq!(signal.order_type, OrderType::Market);
    }

    #[test]
    fn inverted_stops_are_swapped_for_buys() {
        let signal = expect_signal("BUY EURUSD SL: 1.0920 TP: 1.0860");
        assert_eq!(signal.stop_loss, Some(dec!(1.0860)));
        assert_eq!(signal.take_profit_1, Some(dec!(1.0920)));
    }

    #[test]
    fn inverted_stops_are_swapped_for_sells() {
        let signal = expect_signal("SELL USDJPY SL 149.20 TP 150.80");
        assert_eq!(signal.stop_loss, Some(dec!(150.80)));
        assert_eq!(signal.take_profit_1, Some(dec!(149.20)));
    }

    #[test]
    fn equal_stop_and_target_is_invalid() {
        assert!(matches!(
            parse("BUY EURUSD SL 1.0900 TP 1.0900"),
            ParseOutcome::Invalid(_)
        ));
    }

    #[test]
    fn chatter_yields_no_signal() {
        assert_eq!(parse("what a week for the markets"), ParseOutcome::NoSignal);
        assert_eq!(parse("   "), ParseOutcome::NoSignal);
    }

    #[test]
    fn short_alias_is_expanded() {
        let signal = expect_signal("GU SELL TP 1.2600 SL 1.2700");
        assert_eq!(signal.symbol, "GBPUSD");
        assert_eq!(signal.final_symbol, "GBPUSD");
    }

    #[test]
    fn mapping_rejection_propagates() {
        let mapper = SymbolMapper::new(
            Default::default(),
            "",
            "",
            [],
            ["EURUSD".to_string()],
            [],
        );
        let parser = SignalParser::new(mapper);
        assert!(matches!(
            parser.parse("BUY EURUSD SL 1.08 TP 1.09"),
            Err(MappingError::Excluded { .. })
        ));
    }

    #[test]
    fn pending_phrase_sets_limit_type() {
        let signal = expect_signal("BUY LIMIT EURUSD @ 1.0850 SL 1.0800 TP 1.0950");
        assert_eq!(signal.order_type, OrderType::Limit);
        assert_eq!(signal.entry, Some(dec!(1.0850)));
    }

    #[test]
    fn parse_is_deterministic() {
        let a = expect_signal("BUY EURUSD SL 1.0860 TP 1.0920");
        let b = expect_signal("BUY EURUSD SL 1.0860 TP 1.0920");
        assert_eq!(a, b);
    }
}

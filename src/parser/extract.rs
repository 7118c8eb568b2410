//! Ordered signal extractors.
//!
//! Each extractor is a pure function over the normalized text that either
//! recognizes its format and returns a partially-filled signal (symbol,
//! direction, sometimes entry/order type) or declines. They are tried in a
//! fixed order and the first match wins; price fields are completed by the
//! shared post-pass in [`super::prices`].

use rust_decimal::Decimal;

use crate::domain::{Direction, OrderType, ParsedSignal};

use super::symbols::{find_known_symbol, looks_like_symbol};
use super::text::{contains_word, read_decimal, word_occurrences};

const BUY_EMOJI: &[char] = &['🟢', '✅', '📈', '⬆', '🚀', '💹'];
const SELL_EMOJI: &[char] = &['🔴', '❌', '📉', '⬇', '🔻', '💔'];

/// Direction synonyms accepted by the fallback scan, in match order.
const DIRECTION_SYNONYMS: &[&str] = &[
    "BUY", "SELL", "LONG", "SHORT", "BULLISH", "BEARISH", "UP", "DOWN",
];

/// Try all extractors in order; first match wins.
pub(crate) fn extract(text: &str) -> Option<ParsedSignal> {
    const EXTRACTORS: &[fn(&str) -> Option<ParsedSignal>] = &[
        gold_scan,
        direction_then_symbol,
        symbol_then_direction,
        emoji_direction,
        labeled_fields,
        compact_pair,
        pending_order,
        known_symbol_scan,
    ];
    EXTRACTORS.iter().find_map(|extractor| extractor(text))
}

/// The primary direction keywords ("BUY EURUSD" style formats). The wider
/// synonym set is reserved for the fallback scan.
fn primary_direction(token: &str) -> Option<Direction> {
    match token {
        "BUY" | "LONG" => Some(Direction::Buy),
        "SELL" | "SHORT" => Some(Direction::Sell),
        _ => None,
    }
}

/// Gold messages get a dedicated scan: providers frequently post bare
/// "SELL NOW 3342" style calls where only the price range identifies the
/// instrument.
fn gold_scan(text: &str) -> Option<ParsedSignal> {
    if !(text.contains("XAU") || contains_word(text, "GOLD")) {
        return None;
    }
    let direction = text
        .split(' ')
        .find_map(|token| match token {
            "BUY" => Some(Direction::Buy),
            "SELL" => Some(Direction::Sell),
            _ => None,
        })?;

    let mut signal = ParsedSignal::new("XAUUSD", direction);
    signal.entry = gold_entry_price(text, direction);
    Some(signal)
}

/// Entry price after "NOW" or directly after the direction keyword,
/// accepted only inside a plausible gold range.
fn gold_entry_price(text: &str, direction: Direction) -> Option<Decimal> {
    let low = Decimal::from(1000);
    let high = Decimal::from(5000);
    let keyword = match direction {
        Direction::Buy => "BUY",
        Direction::Sell => "SELL",
    };
    for label in ["NOW", keyword] {
        for at in word_occurrences(text, label) {
            let mut cursor = at + label.len();
            while text.as_bytes().get(cursor) == Some(&b' ') {
                cursor += 1;
            }
            if let Some((value, _)) = read_decimal(text, cursor) {
                if value > low && value < high {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// "BUY EURUSD", "SELL NOW XAUUSD", "BUY LIMIT GBPUSD" — direction keyword
/// followed (possibly via filler words) by the instrument.
fn direction_then_symbol(text: &str) -> Option<ParsedSignal> {
    let tokens: Vec<&str> = text.split(' ').collect();
    for (i, &token) in tokens.iter().enumerate() {
        let Some(direction) = primary_direction(token) else {
            continue;
        };
        let mut j = i + 1;
        while j < tokens.len() && matches!(tokens[j], "NOW" | "LIMIT" | "STOP") {
            j += 1;
        }
        let Some(&candidate) = tokens.get(j) else {
            continue;
        };
        if looks_like_symbol(candidate) {
            return Some(ParsedSignal::new(candidate, direction));
        }
        // "SELL NOW 3342" — price where the symbol should be; look for a
        // known instrument elsewhere in the message.
        if candidate.chars().all(|c| c.is_ascii_digit() || c == '.') {
            if let Some(symbol) = find_known_symbol(text) {
                return Some(ParsedSignal::new(symbol, direction));
            }
        }
    }
    None
}

/// "EURUSD BUY" — instrument immediately followed by a direction keyword.
fn symbol_then_direction(text: &str) -> Option<ParsedSignal> {
    let tokens: Vec<&str> = text.split(' ').collect();
    for window in tokens.windows(2) {
        if looks_like_symbol(window[0]) {
            if let Some(direction) = primary_direction(window[1]) {
                return Some(ParsedSignal::new(window[0], direction));
            }
        }
    }
    None
}

/// Direction carried by an emoji marker right before the instrument.
fn emoji_direction(text: &str) -> Option<ParsedSignal> {
    for (at, c) in text.char_indices() {
        let direction = if BUY_EMOJI.contains(&c) {
            Direction::Buy
        } else if SELL_EMOJI.contains(&c) {
            Direction::Sell
        } else {
            continue;
        };
        let rest = &text[at + c.len_utf8()..];
        // the instrument must follow within a couple of tokens
        for token in rest.split(' ').take(3) {
            let cleaned = token.trim_matches(|ch: char| !ch.is_ascii_alphanumeric() && ch != '/');
            if cleaned.is_empty() {
                continue;
            }
            if looks_like_symbol(cleaned) {
                return Some(ParsedSignal::new(cleaned, direction));
            }
        }
    }
    None
}

/// Structured "PAIR: EURUSD / ACTION: BUY" style messages.
fn labeled_fields(text: &str) -> Option<ParsedSignal> {
    let symbol = labeled_token(text, &["PAIR", "SYMBOL", "CURRENCY", "ASSET"])?;
    if !looks_like_symbol(symbol) {
        return None;
    }
    let direction_token = labeled_token(text, &["ACTION", "DIRECTION", "SIGNAL", "TYPE"])?;
    let direction = Direction::from_keyword(direction_token)?;
    Some(ParsedSignal::new(symbol, direction))
}

/// Token following one of `labels` and its value separator, trimmed of
/// stray punctuation.
fn labeled_token<'a>(text: &'a str, labels: &[&str]) -> Option<&'a str> {
    for label in labels {
        for at in word_occurrences(text, label) {
            let value_at = super::text::skip_value_separator(text, at + label.len());
            let token = text[value_at..].split(' ').next().unwrap_or("");
            let token = token.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '/');
            if !token.is_empty() {
                return Some(token);
            }
        }
    }
    None
}

/// Compact "EURUSD-BUY@1.0890" one-token format.
fn compact_pair(text: &str) -> Option<ParsedSignal> {
    for token in text.split(' ') {
        let Some((symbol, rest)) = token.split_once('-') else {
            continue;
        };
        if !looks_like_symbol(symbol) {
            continue;
        }
        let (direction_part, price_part) = match rest.split_once('@') {
            Some((d, p)) => (d, Some(p)),
            None => (rest, None),
        };
        let Some(direction) = primary_direction(direction_part) else {
            continue;
        };
        let mut signal = ParsedSignal::new(symbol, direction);
        if let Some(price) = price_part {
            signal.entry = read_decimal(price, 0).map(|(value, _)| value);
        }
        return Some(signal);
    }
    None
}

/// Explicit pending orders: "BUY LIMIT EURUSD" or "EURUSD SELL STOP".
fn pending_order(text: &str) -> Option<ParsedSignal> {
    let tokens: Vec<&str> = text.split(' ').collect();
    for window in tokens.windows(3) {
        let pending = |token: &str| match token {
            "LIMIT" => Some(OrderType::Limit),
            "STOP" => Some(OrderType::Stop),
            _ => None,
        };
        // BUY LIMIT EURUSD
        if let (Some(direction), Some(order_type)) =
            (primary_direction(window[0]), pending(window[1]))
        {
            if looks_like_symbol(window[2]) {
                let mut signal = ParsedSignal::new(window[2], direction);
                signal.order_type = order_type;
                return Some(signal);
            }
        }
        // EURUSD SELL STOP
        if looks_like_symbol(window[0]) {
            if let (Some(direction), Some(order_type)) =
                (primary_direction(window[1]), pending(window[2]))
            {
                let mut signal = ParsedSignal::new(window[0], direction);
                signal.order_type = order_type;
                return Some(signal);
            }
        }
    }
    None
}

/// Last resort: any known instrument plus any direction synonym anywhere in
/// the message.
fn known_symbol_scan(text: &str) -> Option<ParsedSignal> {
    let symbol = find_known_symbol(text)?;
    for &word in DIRECTION_SYNONYMS {
        if contains_word(text, word) {
            let direction = Direction::from_keyword(word)?;
            return Some(ParsedSignal::new(symbol, direction));
        }
    }
    None
}

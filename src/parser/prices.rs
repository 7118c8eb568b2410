//! Price-field and order-type extraction.
//!
//! Runs after an extractor has established symbol and direction. Labels are
//! tried in priority order and the first hit per field wins; later matches
//! never overwrite a populated field. A scanner tracks consumed spans so a
//! generic label ("TP", "TARGET") cannot re-match text that a more specific
//! one ("TP2") already claimed.

use rust_decimal::Decimal;

use crate::domain::{Direction, OrderType, ParsedSignal};

use super::text::{contains_word, read_decimal, skip_value_separator, word_occurrences};

const STOP_LOSS_LABELS: &[&str] = &[
    "SL", "STOP LOSS", "STOPLOSS", "S.L", "S/L", "STOP", "RISK", "INVALIDATION",
];

const TP3_LABELS: &[&str] = &[
    "TP3", "TP 3", "TAKE PROFIT 3", "TARGET 3", "3RD TP", "3RD TARGET", "THIRD TARGET",
];

const TP2_LABELS: &[&str] = &[
    "TP2", "TP 2", "TAKE PROFIT 2", "TARGET 2", "2ND TP", "2ND TARGET", "SECOND TARGET",
];

const TP1_LABELS: &[&str] = &[
    "TP1",
    "TP 1",
    "TAKE PROFIT 1",
    "TARGET 1",
    "1ST TP",
    "1ST TARGET",
    "FIRST TARGET",
    "TP",
    "TAKE PROFIT",
    "TAKEPROFIT",
    "T.P",
    "T/P",
    "TARGET",
    "PROFIT",
    "GOAL",
    "OBJECTIVE",
];

const TP_LIST_LABELS: &[&str] = &["TPS", "TARGETS", "TP", "TARGET", "PROFIT"];

const ENTRY_LABELS: &[&str] = &[
    "ENTRY", "ENTER", "BUY AT", "SELL AT", "EXECUTION", "PRICE", "OPEN", "@", "AT", "NOW",
    "MARKET", "CURRENT",
];

/// Scans one normalized message for labeled prices, remembering which spans
/// have already produced a value.
struct PriceScanner<'a> {
    text: &'a str,
    used: Vec<(usize, usize)>,
}

impl<'a> PriceScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            used: Vec::new(),
        }
    }

    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.used.iter().any(|&(s, e)| start < e && s < end)
    }

    /// First label (in priority order) followed by a parseable number on an
    /// unconsumed span.
    fn labeled(&mut self, labels: &[&str]) -> Option<Decimal> {
        for label in labels {
            for at in word_occurrences(self.text, label) {
                let label_end = at + label.len();
                if self.overlaps(at, label_end) {
                    continue;
                }
                let value_at = skip_value_separator(self.text, label_end);
                if let Some((value, value_end)) = read_decimal(self.text, value_at) {
                    self.used.push((at, value_end));
                    return Some(value);
                }
            }
        }
        None
    }

    /// A label followed by a comma/semicolon-separated run of at least two
    /// numbers, e.g. "TP: 1.0900, 1.0950, 1.1000".
    fn labeled_list(&mut self, labels: &[&str]) -> Vec<Decimal> {
        for label in labels {
            for at in word_occurrences(self.text, label) {
                let label_end = at + label.len();
                if self.overlaps(at, label_end) {
                    continue;
                }
                let mut cursor = skip_value_separator(self.text, label_end);
                let mut values = Vec::new();
                while let Some((value, end)) = read_decimal(self.text, cursor) {
                    values.push(value);
                    let mut next = end;
                    while self.text.as_bytes().get(next) == Some(&b' ') {
                        next += 1;
                    }
                    match self.text.as_bytes().get(next) {
                        Some(b',') | Some(b';') => {
                            next += 1;
                            while self.text.as_bytes().get(next) == Some(&b' ') {
                                next += 1;
                            }
                            cursor = next;
                        }
                        _ => {
                            cursor = end;
                            break;
                        }
                    }
                }
                if values.len() >= 2 {
                    self.used.push((at, cursor));
                    return values;
                }
            }
        }
        Vec::new()
    }
}

/// Fill any price fields the extractor did not populate.
pub(crate) fn extract_prices(text: &str, signal: &mut ParsedSignal) {
    let mut scanner = PriceScanner::new(text);

    if signal.stop_loss.is_none() {
        signal.stop_loss = scanner.labeled(STOP_LOSS_LABELS);
    }

    // Highest ordinal first so the generic TP labels cannot claim them.
    if signal.take_profit_3.is_none() {
        signal.take_profit_3 = scanner.labeled(TP3_LABELS);
    }
    if signal.take_profit_2.is_none() {
        signal.take_profit_2 = scanner.labeled(TP2_LABELS);
    }
    if signal.take_profit_1.is_none() {
        signal.take_profit_1 = scanner.labeled(TP1_LABELS);
    }

    if signal.take_profit_1.is_none()
        || signal.take_profit_2.is_none()
        || signal.take_profit_3.is_none()
    {
        // The list may share its label with an already-claimed single value
        // ("TP: 1.0900, 1.0950"), so scan it on a fresh view of the text.
        let list = PriceScanner::new(text).labeled_list(TP_LIST_LABELS);
        let slots = [
            &mut signal.take_profit_1,
            &mut signal.take_profit_2,
            &mut signal.take_profit_3,
        ];
        for (value, slot) in list.into_iter().zip(slots) {
            if slot.is_none() {
                *slot = Some(value);
            }
        }
    }

    if signal.entry.is_none() {
        signal.entry = scanner.labeled(ENTRY_LABELS);
    }

    apply_price_range(text, signal);
}

/// Interpret a bare "a-b" price range: for a buy the lower bound is the
/// entry and the upper the first target; inverted for a sell. Only fills
/// fields that are still empty.
fn apply_price_range(text: &str, signal: &mut ParsedSignal) {
    if signal.entry.is_some() && signal.take_profit_1.is_some() {
        return;
    }
    let Some((low, high)) = find_price_range(text) else {
        return;
    };
    match signal.direction {
        Direction::Buy => {
            signal.entry.get_or_insert(low);
            signal.take_profit_1.get_or_insert(high);
        }
        Direction::Sell => {
            signal.entry.get_or_insert(high);
            signal.take_profit_1.get_or_insert(low);
        }
    }
}

fn find_price_range(text: &str) -> Option<(Decimal, Decimal)> {
    let bytes = text.as_bytes();
    let mut at = 0usize;
    while at < bytes.len() {
        if !bytes[at].is_ascii_digit() {
            at += 1;
            continue;
        }
        // number must start on a boundary, not be the tail of a token
        let standalone = at == 0
            || !(bytes[at - 1].is_ascii_alphanumeric() || bytes[at - 1] == b'.');
        if let (true, Some((first, end))) = (standalone, read_decimal(text, at)) {
            let mut cursor = end;
            while bytes.get(cursor) == Some(&b' ') {
                cursor += 1;
            }
            if bytes.get(cursor) == Some(&b'-') {
                cursor += 1;
                while bytes.get(cursor) == Some(&b' ') {
                    cursor += 1;
                }
                if let Some((second, _)) = read_decimal(text, cursor) {
                    return Some((first.min(second), first.max(second)));
                }
            }
            at = end;
        } else {
            at += 1;
            while at < bytes.len() && bytes[at].is_ascii_digit() {
                at += 1;
            }
        }
    }
    None
}

/// Infer the order type from explicit keywords. Leaves a type the extractor
/// already set (e.g. from a "BUY LIMIT EURUSD" phrase) alone.
pub(crate) fn infer_order_type(text: &str, signal: &mut ParsedSignal) {
    if signal.order_type != OrderType::Market {
        return;
    }
    let limit_phrase = contains_word(text, "BUY LIMIT")
        || contains_word(text, "SELL LIMIT")
        || contains_word(text, "LIMIT ORDER");
    if limit_phrase {
        signal.order_type = OrderType::Limit;
        return;
    }
    let stop_phrase = contains_word(text, "BUY STOP")
        || contains_word(text, "SELL STOP")
        || contains_word(text, "STOP ORDER");
    if stop_phrase {
        signal.order_type = OrderType::Stop;
        return;
    }
    if contains_word(text, "PENDING") && signal.entry.is_some() {
        let below = contains_word(text, "BELOW");
        let above = contains_word(text, "ABOVE");
        signal.order_type = match (signal.direction, below, above) {
            (Direction::Buy, true, _) => OrderType::Limit,
            (Direction::Buy, _, true) => OrderType::Stop,
            (Direction::Sell, _, true) => OrderType::Limit,
            (Direction::Sell, true, _) => OrderType::Stop,
            _ => OrderType::Market,
        };
    }
    // NOW / INSTANT / MARKET / CURRENT / IMMEDIATELY all mean the default.
}

//! Known-symbol table and symbol normalization.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::text::contains_word;

/// Instruments signal providers are known to mention, used by the fallback
/// extractor. Order matters: earlier entries win when several appear.
static SYMBOL_TABLE: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Major forex pairs
        "EURUSD", "GBPUSD", "USDJPY", "USDCHF", "AUDUSD", "USDCAD", "NZDUSD",
        // Minor forex pairs
        "EURJPY", "GBPJPY", "EURGBP", "EURAUD", "EURCAD", "EURNZD", "EURCHF",
        "GBPAUD", "GBPCAD", "GBPNZD", "GBPCHF", "AUDJPY", "CADJPY", "NZDJPY",
        "AUDNZD", "AUDCAD", "AUDCHF", "NZDCAD", "NZDCHF", "CADCHF", "CHFJPY",
        // Exotics
        "USDZAR", "USDTRY", "USDMXN", "USDSEK", "USDNOK", "USDDKK", "USDPLN",
        "USDHUF", "USDCZK", "USDSGD", "USDHKD", "USDCNH", "USDRUB", "USDINR",
        "EURTRY", "EURPLN", "EURHUF", "EURCZK", "EURSEK", "EURNOK", "EURDKK",
        "GBPTRY", "GBPPLN", "GBPSEK", "GBPNOK", "GBPDKK",
        // Metals
        "XAUUSD", "GOLD", "XAGUSD", "SILVER", "XPTUSD", "PLATINUM", "XPDUSD",
        "PALLADIUM", "XAUEUR", "XAGEUR", "XAUAUD", "XAUGBP", "XAUCHF", "XAUJPY",
        // Energy
        "USOIL", "UKOIL", "BRENT", "WTI", "CRUDE", "NATGAS", "NGAS",
        // Indices
        "US30", "DJIA", "DOW", "DJ30", "US100", "NAS100", "NASDAQ", "NDX",
        "USTEC", "SPX500", "SP500", "SPX", "US500", "USA500", "GER30", "GER40",
        "DAX", "DAX30", "DAX40", "DE30", "DE40", "UK100", "FTSE", "FTSE100",
        "UKX", "FRA40", "CAC", "CAC40", "FR40", "EU50", "STOXX50", "EUSTX50",
        "JPN225", "NIKKEI", "N225", "JP225", "AUS200", "ASX200", "AU200",
        "HK50", "HSI", "HANGSENG", "CHINA50", "CHN50", "CN50", "ESP35", "IBEX",
        "IBEX35", "ITA40", "IT40", "MIB40", "SUI20", "SMI", "SMI20", "NED25",
        "AEX", "AEX25",
        // Crypto
        "BTCUSD", "BITCOIN", "BTC", "ETHUSD", "ETHEREUM", "ETH", "XRPUSD",
        "RIPPLE", "XRP", "LTCUSD", "LITECOIN", "LTC", "BCHUSD", "BCH",
        "BNBUSD", "BNB", "ADAUSD", "CARDANO", "ADA", "DOTUSD", "POLKADOT",
        "DOT", "LINKUSD", "CHAINLINK", "LINK", "XLMUSD", "STELLAR", "XLM",
        "DOGEUSD", "DOGECOIN", "DOGE", "UNIUSD", "UNISWAP", "UNI", "SOLUSD",
        "SOLANA", "SOL", "MATICUSD", "POLYGON", "MATIC", "AVAXUSD",
        "AVALANCHE", "AVAX", "ATOMUSD", "COSMOS", "ATOM", "BTCEUR", "ETHEUR",
        "BTCGBP", "ETHGBP", "BTCJPY", "ETHJPY", "BTCAUD", "ETHAUD", "BTCCAD",
        "ETHCAD",
        // Commodities
        "CORN", "WHEAT", "SOYBEAN", "SOYB", "SUGAR", "COFFEE", "COCOA",
        "COTTON", "RICE", "OATS", "CATTLE", "HOGS", "COPPER", "ZINC",
        "ALUMINUM", "NICKEL", "LEAD", "TIN",
        // Common stock CFDs
        "AAPL", "APPLE", "GOOGL", "GOOGLE", "MSFT", "MICROSOFT", "AMZN",
        "AMAZON", "META", "FACEBOOK", "TSLA", "TESLA", "NVDA", "NVIDIA",
        "JPM", "BAC", "VISA", "MASTERCARD", "WMT", "WALMART", "DIS", "DISNEY",
        "PYPL", "PAYPAL", "NFLX", "NETFLIX", "ADBE", "ADOBE", "CRM", "PFE",
        "PFIZER", "AMD", "INTEL", "INTC",
        // Bonds
        "USB02Y", "USB05Y", "USB10Y", "USB30Y", "BUND", "GILT", "JGB",
        // Short forms providers like to use
        "EU", "GU", "UJ", "UC", "AU", "NU", "UCAD", "GJ", "EJ", "EG", "GA",
        "GN", "EA", "EN", "AJ", "NJ", "OIL", "GAS",
    ]
});

/// Short-form aliases expanded during symbol normalization.
static SHORT_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("EU", "EURUSD"),
        ("GU", "GBPUSD"),
        ("UJ", "USDJPY"),
        ("UC", "USDCHF"),
        ("AU", "AUDUSD"),
        ("NU", "NZDUSD"),
        ("UCAD", "USDCAD"),
        ("GJ", "GBPJPY"),
        ("EJ", "EURJPY"),
        ("EG", "EURGBP"),
        ("XAU", "XAUUSD"),
        ("XAG", "XAGUSD"),
        ("GOLD", "XAUUSD"),
        ("SILVER", "XAGUSD"),
        ("BTC", "BTCUSD"),
        ("ETH", "ETHUSD"),
        ("OIL", "USOIL"),
        ("GER", "GER30"),
        ("NAS", "NAS100"),
        ("SPX", "SPX500"),
        ("DJI", "US30"),
        ("DOW", "US30"),
    ])
});

/// Tokens that can follow a direction keyword without being the instrument.
const SYMBOL_STOPWORDS: &[&str] = &[
    "NOW", "LIMIT", "STOP", "AT", "ON", "IN", "THE", "AND", "FOR", "WITH",
    "SL", "TP", "TP1", "TP2", "TP3", "ENTRY", "TARGET", "PROFIT", "PRICE",
    "ZONE", "VIP",
];

/// Whether a normalized token plausibly names an instrument.
pub(crate) fn looks_like_symbol(token: &str) -> bool {
    let len = token.chars().count();
    if !(2..=12).contains(&len) {
        return false;
    }
    if SYMBOL_STOPWORDS.contains(&token) {
        return false;
    }
    let alpha = token.chars().filter(char::is_ascii_uppercase).count();
    alpha >= 2
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '/')
}

/// First known instrument mentioned anywhere in the text, if any.
pub(crate) fn find_known_symbol(text: &str) -> Option<&'static str> {
    SYMBOL_TABLE
        .iter()
        .copied()
        .find(|symbol| contains_word(text, symbol))
}

/// Canonicalize a raw symbol token: strip pair separators and expand
/// short-form aliases.
pub(crate) fn normalize_symbol(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_'))
        .collect();
    match SHORT_ALIASES.get(stripped.as_str()) {
        Some(expanded) => (*expanded).to_string(),
        None => stripped,
    }
}

//! Entity Extractor
//!
//! Assigns an intent label, a confidence and a set of entities to raw text.
//! Rules are evaluated in order and the first one that fires wins:
//! - Small talk (greet / goodbye / thanks / help) on whole-utterance matches
//! - Crypto and forecast phrasing, which claims the text before any ticker lookup
//! - Stock cue words, with ticker extraction gated behind the stop-list
//! - Generic questions
//!
//! Pure over the input text and the static tables below.

use crate::models::{ClassificationResult, Entities};
use lazy_static::lazy_static;
use regex::Regex;

pub const INTENT_GREET: &str = "greet";
pub const INTENT_GOODBYE: &str = "goodbye";
pub const INTENT_THANKS: &str = "thanks";
pub const INTENT_HELP: &str = "help";
pub const INTENT_STOCK_PRICE: &str = "stock_price";
pub const INTENT_GENERAL_QUERY: &str = "general_query";

pub const ENTITY_TICKER: &str = "ticker";
pub const ENTITY_CRYPTO_ASSET: &str = "crypto_asset";
pub const ENTITY_HORIZON_YEARS: &str = "horizon_years";

const CONFIDENCE_EXACT: f32 = 0.95;
const CONFIDENCE_HELP: f32 = 0.9;
const CONFIDENCE_TICKER: f32 = 0.9;
const CONFIDENCE_DOMAIN: f32 = 0.85;
const CONFIDENCE_QUESTION: f32 = 0.75;
const CONFIDENCE_PARTIAL_GREETING: f32 = 0.45;
const CONFIDENCE_MISSING_TICKER: f32 = 0.4;

/// Static phrase lists, matched against the normalized utterance
const GREETINGS: &[&str] = &[
    "hi", "hello", "hey", "hey there", "hello there", "hi there", "howdy",
    "greetings", "good morning", "good afternoon", "good evening",
];

const FAREWELLS: &[&str] = &[
    "bye", "goodbye", "bye bye", "see you", "see you later", "good night", "farewell",
];

const THANKS: &[&str] = &[
    "thanks", "thank you", "thanks a lot", "thank you very much", "many thanks", "cheers",
];

const HELP_PHRASES: &[&str] = &[
    "help", "help me", "what can you do", "what do you do", "how do i use this", "show commands",
];

/// Crypto and price-prediction phrasing. Outranks ticker extraction.
const DOMAIN_INDICATORS: &[&str] = &[
    "crypto", "cryptocurrency", "cryptocurrencies", "bitcoin", "blockchain", "altcoin",
    "price prediction", "price target", "forecast", "predict", "prediction",
    "will be worth", "worth in",
];

/// Words that make a ticker lookup plausible
const STOCK_CUES: &[&str] = &[
    "price", "prices", "stock", "stocks", "share", "shares", "ticker", "quote",
    "trading at", "market cap",
];

const QUESTION_WORDS: &[&str] = &[
    "what", "whats", "when", "who", "where", "why", "how", "which", "explain",
    "tell me", "describe", "compare", "is there", "can you", "should i",
];

/// Tokens never accepted as tickers: common words, cue words and domain verbs
const TICKER_STOP_LIST: &[&str] = &[
    "A", "AN", "THE", "I", "IS", "IT", "ITS", "OF", "ON", "IN", "AT", "TO", "FOR", "AND", "OR",
    "BY", "ME", "MY", "WE", "US", "YOU", "DO", "DOES", "BE", "WAS", "ARE", "WILL", "CAN",
    "WHAT", "WHATS", "HOW", "MUCH", "MANY", "WHY", "WHO", "WHEN", "THAT", "THIS", "WITH",
    "BASED", "ABOUT", "FROM", "SOME", "ANY", "ALL", "NEXT", "LAST", "TELL", "SHOW", "GIVE",
    "GET", "CHECK", "FIND", "LOOK", "SEE", "NOW", "TODAY", "CURRENT", "LATEST", "LIVE",
    "PRICE", "PRICES", "STOCK", "STOCKS", "SHARE", "SHARES", "TICKER", "QUOTE", "MARKET",
    "CAP", "VALUE", "WORTH", "BUY", "SELL", "TRADE", "HOLD", "INVEST", "PREDICT", "OWN",
    "USD", "EUR", "INR", "GBP", "OK", "OKAY", "PLEASE", "PER", "CEO", "AI",
];

/// Company names mapped to their listing symbol
const COMPANY_ALIASES: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("tesla", "TSLA"),
    ("microsoft", "MSFT"),
    ("google", "GOOGL"),
    ("alphabet", "GOOGL"),
    ("amazon", "AMZN"),
    ("nvidia", "NVDA"),
    ("netflix", "NFLX"),
    ("reliance", "RELIANCE"),
    ("infosys", "INFY"),
    ("wipro", "WIPRO"),
];

const CRYPTO_ASSETS: &[(&str, &str)] = &[
    ("bitcoin", "BTC"),
    ("btc", "BTC"),
    ("ethereum", "ETH"),
    ("ether", "ETH"),
    ("eth", "ETH"),
    ("xrp", "XRP"),
    ("ripple", "XRP"),
    ("solana", "SOL"),
    ("dogecoin", "DOGE"),
    ("doge", "DOGE"),
    ("cardano", "ADA"),
    ("litecoin", "LTC"),
];

lazy_static! {
    static ref CASH_TAG: Regex = Regex::new(r"\$([A-Za-z]{1,5})\b").expect("cash tag pattern");
    static ref UPPER_TOKEN: Regex = Regex::new(r"\b[A-Z]{1,5}\b").expect("upper token pattern");
    static ref HORIZON: Regex =
        Regex::new(r"\b(\d{1,3})\s*-?\s*(?:years?|yrs?)\b").expect("horizon pattern");
}

/// Rule-based entity extractor
pub struct EntityExtractor;

impl EntityExtractor {
    /// Classify raw text into intent, confidence and entities
    pub fn classify(text: &str) -> ClassificationResult {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return ClassificationResult::unknown(text);
        }

        let mut entities = extract_context_entities(&normalized);

        let (intent, confidence) = if is_one_of(&normalized, GREETINGS) {
            (INTENT_GREET, CONFIDENCE_EXACT)
        } else if is_one_of(&normalized, FAREWELLS) {
            (INTENT_GOODBYE, CONFIDENCE_EXACT)
        } else if is_one_of(&normalized, THANKS) {
            (INTENT_THANKS, CONFIDENCE_EXACT)
        } else if is_one_of(&normalized, HELP_PHRASES) {
            (INTENT_HELP, CONFIDENCE_HELP)
        } else if has_domain_indicator(&normalized, &entities) {
            (INTENT_GENERAL_QUERY, CONFIDENCE_DOMAIN)
        } else if contains_any(&normalized, STOCK_CUES) {
            match extract_ticker(text, &normalized) {
                Some(ticker) => {
                    entities.insert(ENTITY_TICKER.to_string(), ticker);
                    (INTENT_STOCK_PRICE, CONFIDENCE_TICKER)
                }
                None if is_question(text, &normalized) => {
                    (INTENT_GENERAL_QUERY, CONFIDENCE_QUESTION)
                }
                None => (INTENT_STOCK_PRICE, CONFIDENCE_MISSING_TICKER),
            }
        } else if is_question(text, &normalized) {
            (INTENT_GENERAL_QUERY, CONFIDENCE_QUESTION)
        } else if starts_with_any(&normalized, GREETINGS) {
            (INTENT_GREET, CONFIDENCE_PARTIAL_GREETING)
        } else {
            return ClassificationResult::unknown(text);
        };

        ClassificationResult {
            intent: intent.to_string(),
            confidence,
            entities,
            raw_text: text.to_string(),
        }
    }
}

/// Lowercase, replace punctuation with spaces (keeping `$`, `/` and inner dots), collapse whitespace
pub(crate) fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '$' || c == '/' || c == '.' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(|w| w.trim_matches('.'))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Word-boundary phrase containment on normalized text
pub(crate) fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    format!(" {} ", normalized).contains(&format!(" {} ", phrase))
}

fn contains_any(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(normalized, p))
}

fn is_one_of(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| normalized == *p)
}

fn starts_with_any(normalized: &str, phrases: &[&str]) -> bool {
    phrases
        .iter()
        .any(|p| normalized.starts_with(&format!("{} ", p)))
}

/// A horizon alone ("2 years ago") is not forecast phrasing; it needs a crypto asset
fn has_domain_indicator(normalized: &str, entities: &Entities) -> bool {
    contains_any(normalized, DOMAIN_INDICATORS)
        || (entities.contains_key(ENTITY_CRYPTO_ASSET) && entities.contains_key(ENTITY_HORIZON_YEARS))
}

fn is_question(raw: &str, normalized: &str) -> bool {
    raw.trim_end().ends_with('?') || contains_any(normalized, QUESTION_WORDS)
}

fn is_stop_word(candidate: &str) -> bool {
    TICKER_STOP_LIST.contains(&candidate)
}

/// Entities extracted regardless of intent
fn extract_context_entities(normalized: &str) -> Entities {
    let mut entities = Entities::new();

    if let Some(symbol) = normalized
        .split_whitespace()
        .find_map(|word| lookup(CRYPTO_ASSETS, word))
    {
        entities.insert(ENTITY_CRYPTO_ASSET.to_string(), symbol.to_string());
    }

    if let Some(years) = HORIZON.captures(normalized).and_then(|c| c.get(1)) {
        entities.insert(ENTITY_HORIZON_YEARS.to_string(), years.as_str().to_string());
    }

    entities
}

/// Ticker lookup, strongest signal first: cash-tag, company alias,
/// all-caps token, then the word right before a cue word.
fn extract_ticker(raw: &str, normalized: &str) -> Option<String> {
    let accept = |candidate: String| -> Option<String> {
        let is_crypto = lookup(CRYPTO_ASSETS, &candidate.to_lowercase()).is_some();
        if is_stop_word(&candidate) || is_crypto {
            None
        } else {
            Some(candidate)
        }
    };

    if let Some(found) = CASH_TAG
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .find_map(|m| accept(m.as_str().to_uppercase()))
    {
        return Some(found);
    }

    let words: Vec<&str> = normalized.split_whitespace().collect();

    if let Some(symbol) = words.iter().find_map(|w| lookup(COMPANY_ALIASES, w)) {
        return Some(symbol.to_string());
    }

    if let Some(found) = UPPER_TOKEN
        .find_iter(raw)
        .find_map(|m| accept(m.as_str().to_string()))
    {
        return Some(found);
    }

    words
        .windows(2)
        .filter(|pair| STOCK_CUES.contains(&pair[1]))
        .map(|pair| pair[0])
        .filter(|w| (1..=5).contains(&w.len()) && w.chars().all(|c| c.is_ascii_alphabetic()))
        .find_map(|w| accept(w.to_uppercase()))
}

fn lookup(table: &[(&str, &'static str)], word: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, symbol)| *symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN_INTENT;

    #[test]
    fn test_small_talk() {
        let cases = vec![
            ("Hi!", INTENT_GREET),
            ("good morning", INTENT_GREET),
            ("Goodbye.", INTENT_GOODBYE),
            ("thank you very much", INTENT_THANKS),
            ("What can you do?", INTENT_HELP),
        ];

        for (text, intent) in cases {
            let result = EntityExtractor::classify(text);
            assert_eq!(result.intent, intent, "input: {}", text);
            assert!(result.confidence >= 0.9);
        }
    }

    #[test]
    fn test_ticker_extraction() {
        let cases = vec![
            ("What is the price of AAPL", "AAPL"),
            ("$tsla quote please", "TSLA"),
            ("apple stock price", "AAPL"),
            ("nflx share price", "NFLX"),
        ];

        for (text, ticker) in cases {
            let result = EntityExtractor::classify(text);
            assert_eq!(result.intent, INTENT_STOCK_PRICE, "input: {}", text);
            assert_eq!(result.entity(ENTITY_TICKER), Some(ticker), "input: {}", text);
            assert!(result.confidence >= 0.9);
        }
    }

    #[test]
    fn test_crypto_forecast_never_yields_based_ticker() {
        let text = "Based on the crypto industry, how much will XRP be worth in 10 years?";
        let result = EntityExtractor::classify(text);

        assert_eq!(result.intent, INTENT_GENERAL_QUERY);
        assert!(result.entity(ENTITY_TICKER).is_none());
        assert_eq!(result.entity(ENTITY_CRYPTO_ASSET), Some("XRP"));
        assert_eq!(result.entity(ENTITY_HORIZON_YEARS), Some("10"));
    }

    #[test]
    fn test_horizon_without_crypto_keeps_ticker() {
        let result = EntityExtractor::classify("TSLA stock price 2 years ago");
        assert_eq!(result.intent, INTENT_STOCK_PRICE);
        assert_eq!(result.entity(ENTITY_TICKER), Some("TSLA"));
        assert_eq!(result.entity(ENTITY_HORIZON_YEARS), Some("2"));

        let result = EntityExtractor::classify("eth in 5 years");
        assert_eq!(result.intent, INTENT_GENERAL_QUERY);
        assert_eq!(result.entity(ENTITY_CRYPTO_ASSET), Some("ETH"));
    }

    #[test]
    fn test_stop_listed_words_before_cue_are_rejected() {
        let result = EntityExtractor::classify("Based on price");
        assert!(result.entity(ENTITY_TICKER).is_none());
        assert_eq!(result.intent, INTENT_STOCK_PRICE);
        assert!(result.confidence < 0.5);

        let result = EntityExtractor::classify("THE STOCK PRICE NOW");
        assert!(result.entity(ENTITY_TICKER).is_none());
    }

    #[test]
    fn test_price_question_without_ticker_is_general() {
        let result = EntityExtractor::classify("what is the price of an enterprise subscription?");
        assert_eq!(result.intent, INTENT_GENERAL_QUERY);
        assert!(result.entity(ENTITY_TICKER).is_none());
    }

    #[test]
    fn test_partial_greeting_is_low_confidence() {
        let result = EntityExtractor::classify("hello there my friend");
        assert_eq!(result.intent, INTENT_GREET);
        assert!(result.confidence < 0.5);
    }

    #[test]
    fn test_unknown() {
        for text in ["", "   ", "zebra crossing", "lorem ipsum dolor"] {
            let result = EntityExtractor::classify(text);
            assert_eq!(result.intent, UNKNOWN_INTENT, "input: {:?}", text);
            assert_eq!(result.confidence, 0.0);
            assert!(result.entities.is_empty());
        }
    }

    #[test]
    fn test_classify_is_idempotent() {
        let inputs = [
            "Based on the crypto industry, how much will XRP be worth in 10 years",
            "apple stock price",
            "When did World War II end?",
            "qwerty",
        ];

        for text in inputs {
            assert_eq!(EntityExtractor::classify(text), EntityExtractor::classify(text));
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  When did World War II end?! "), "when did world war ii end");
        assert_eq!(normalize("Upgrade to HTTP/2."), "upgrade to http/2");
        assert!(contains_phrase("how much will it cost", "how much"));
        assert!(!contains_phrase("showmuch", "how much"));
    }
}

//! Answer interpreter: maps free text onto a schema entry's value.

use std::sync::LazyLock;

use regex::Regex;

use super::schema::{FeatureKind, FeatureSchema};

/// First signed, optionally decimal, number anywhere in the text.
static SIGNED_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid number pattern"));

/// A standalone integer token ("3", "option 2", "3+ adults" but not "9th").
static BARE_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("valid integer pattern"));

/// Outcome of interpreting one reply against one schema entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// A number within bounds, an option code, or an exact option label.
    Exact {
        value: i64,
        label: Option<&'static str>,
    },
    /// Best-guess alias match; the user is invited to correct it.
    Interpreted { value: i64, label: &'static str },
    NoMatch(Rejection),
}

impl Interpretation {
    /// The accepted value, if any.
    pub fn value(&self) -> Option<i64> {
        match self {
            Self::Exact { value, .. } | Self::Interpreted { value, .. } => Some(*value),
            Self::NoMatch(_) => None,
        }
    }
}

/// Why a reply was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Numeric question, no number in the reply.
    NoNumber,
    /// Numeric question, number outside the inclusive bounds.
    OutOfRange { min: i64, max: i64 },
    /// Categorical question, nothing matched.
    NoOption,
}

/// Interpret `text` as an answer to `schema`.
pub fn interpret(schema: &FeatureSchema, text: &str) -> Interpretation {
    match schema.kind {
        FeatureKind::Numeric { min, max, .. } => interpret_numeric(min, max, text),
        FeatureKind::Categorical { .. } => interpret_categorical(schema, text),
    }
}

fn interpret_numeric(min: i64, max: i64, text: &str) -> Interpretation {
    let Some(n) = SIGNED_NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
    else {
        return Interpretation::NoMatch(Rejection::NoNumber);
    };

    if n < min as f64 || n > max as f64 {
        return Interpretation::NoMatch(Rejection::OutOfRange { min, max });
    }

    Interpretation::Exact {
        value: n.round() as i64,
        label: None,
    }
}

fn interpret_categorical(schema: &FeatureSchema, text: &str) -> Interpretation {
    let options = schema.options();
    let lower = normalize(text);

    // 1. A bare integer is an option code.
    if let Some(opt) = BARE_INTEGER
        .find(&lower)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .and_then(|code| schema.option_for_code(code))
    {
        return Interpretation::Exact {
            value: opt.code,
            label: Some(opt.label),
        };
    }

    // 2. Exact display label.
    if let Some(opt) = options.iter().find(|o| normalize(o.label) == lower) {
        return Interpretation::Exact {
            value: opt.code,
            label: Some(opt.label),
        };
    }

    // 3. Alias containment, first option in list order wins.
    for opt in options {
        if opt
            .aliases
            .iter()
            .any(|alias| contains_phrase(&lower, &normalize(alias)))
        {
            return Interpretation::Interpreted {
                value: opt.code,
                label: opt.label,
            };
        }
    }

    Interpretation::NoMatch(Rejection::NoOption)
}

/// Trim, lowercase, and fold typographic apostrophes.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace('\u{2019}', "'")
}

/// Whether `phrase` occurs in `haystack` as whole words.
///
/// Both inputs are expected to be normalized. An edge of the phrase that is
/// itself punctuation ("3+") needs no boundary on that side.
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let Some(first) = phrase.chars().next() else {
        return false;
    };
    let last = phrase.chars().next_back().unwrap_or(first);

    haystack.match_indices(phrase).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = !is_word_char(first)
            || !haystack[..start].chars().next_back().is_some_and(is_word_char);
        let after_ok =
            !is_word_char(last) || !haystack[end..].chars().next().is_some_and(is_word_char);
        before_ok && after_ok
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\''
}

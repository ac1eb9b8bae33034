//! Version parsing and comparison for plugin description fields.
//!
//! Versions split on any non-alphanumeric separator; numeric runs compare
//! numerically and alphabetic runs compare case-insensitively, with the
//! shorter sequence padded by zero/empty. So `1.2 == 1.2.0`, `1.10 > 1.2`
//! and `1.0a < 1.0b`.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Identifier {
    Numeric(u64),
    Alpha(String),
}

impl Identifier {
    fn cmp_padded(&self, other: &Identifier) -> Ordering {
        match (self, other) {
            (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
            (Identifier::Alpha(a), Identifier::Alpha(b)) => a.cmp(b),
            // Numeric runs order before alphabetic runs.
            (Identifier::Numeric(_), Identifier::Alpha(_)) => Ordering::Less,
            (Identifier::Alpha(_), Identifier::Numeric(_)) => Ordering::Greater,
        }
    }

    fn padding_for(&self) -> Identifier {
        match self {
            Identifier::Numeric(_) => Identifier::Numeric(0),
            Identifier::Alpha(_) => Identifier::Alpha(String::new()),
        }
    }
}

/// A parsed version string with pseudo-semantic ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    identifiers: Vec<Identifier>,
}

impl Version {
    /// Parse a version string. Parsing is infallible: anything that is not
    /// an alphanumeric run acts as a separator, and an empty or wholly
    /// non-alphanumeric string compares as version zero.
    pub fn parse(text: &str) -> Self {
        let mut identifiers = Vec::new();
        let mut digits = String::new();
        let mut alphas = String::new();

        let mut flush = |digits: &mut String, alphas: &mut String| {
            if !digits.is_empty() {
                // Runs longer than u64 saturate rather than fail.
                let value = digits.parse::<u64>().unwrap_or(u64::MAX);
                identifiers.push(Identifier::Numeric(value));
                digits.clear();
            }
            if !alphas.is_empty() {
                identifiers.push(Identifier::Alpha(alphas.to_ascii_lowercase()));
                alphas.clear();
            }
        };

        for ch in text.chars() {
            if ch.is_ascii_digit() {
                if !alphas.is_empty() {
                    flush(&mut digits, &mut alphas);
                }
                digits.push(ch);
            } else if ch.is_ascii_alphabetic() {
                if !digits.is_empty() {
                    flush(&mut digits, &mut alphas);
                }
                alphas.push(ch);
            } else {
                flush(&mut digits, &mut alphas);
            }
        }
        flush(&mut digits, &mut alphas);

        Version { identifiers }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.identifiers.len().max(other.identifiers.len());
        for i in 0..len {
            let (a, b) = match (self.identifiers.get(i), other.identifiers.get(i)) {
                (Some(a), Some(b)) => (a.clone(), b.clone()),
                (Some(a), None) => {
                    let pad = a.padding_for();
                    (a.clone(), pad)
                }
                (None, Some(b)) => {
                    let pad = b.padding_for();
                    (pad, b.clone())
                }
                (None, None) => break,
            };
            let ord = a.cmp_padded(&b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Best-effort extraction of a version string from a plugin description
/// field. Returns the first token that looks like a dotted version, e.g.
/// "Version: 1.2.3" yields "1.2.3".
pub fn extract_version(description: &str) -> Option<String> {
    static VERSION_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = VERSION_PATTERN.get_or_init(|| {
        Regex::new(r"\d+(?:[._]\d+)*[a-zA-Z]*").expect("Invalid version regex")
    });

    pattern
        .find(description)
        .map(|m| m.as_str().replace('_', "."))
}

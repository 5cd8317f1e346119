use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::types::{ThresholdKind, ThresholdValue};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid threshold \"{input}\": {reason}")]
pub struct ThresholdError {
    pub input: String,
    pub reason: String,
}

impl ThresholdError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

static RE_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]*\.?[0-9]*)\s*kB$").expect("valid regex"));

static RE_PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)\s*%$").expect("valid regex"));

/// Parses `"1.5 kB"` (bytes, 1 kB = 1024 B) or `"10%"` into a threshold.
pub fn parse_threshold(input: &str) -> Result<ThresholdValue, ThresholdError> {
    let trimmed = input.trim();

    if let Some(cap) = RE_SIZE.captures(trimmed) {
        let raw = &cap[1];
        let kb: f64 = raw
            .parse()
            .map_err(|_| ThresholdError::new(input, format!("\"{raw}\" is not a number")))?;

        return Ok(ThresholdValue {
            size: kb * 1024.0,
            kind: ThresholdKind::Size,
        });
    }

    if let Some(cap) = RE_PERCENT.captures(trimmed) {
        let percent: f64 = cap[1]
            .parse()
            .map_err(|_| ThresholdError::new(input, "percentage is not a number"))?;

        if percent <= 0.0 || percent > 100.0 {
            return Err(ThresholdError::new(
                input,
                "percentage must be greater than 0 and at most 100",
            ));
        }

        return Ok(ThresholdValue {
            size: percent,
            kind: ThresholdKind::Percent,
        });
    }

    Err(ThresholdError::new(
        input,
        "expected a size like \"10 kB\" or a percentage like \"10%\"",
    ))
}

impl FromStr for ThresholdValue {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_threshold(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes_in_kilobytes() {
        assert_eq!(
            parse_threshold("10kB").unwrap(),
            ThresholdValue {
                size: 10240.0,
                kind: ThresholdKind::Size
            }
        );
        assert_eq!(parse_threshold("1.5 kB").unwrap().size, 1536.0);
        assert_eq!(parse_threshold(".5kB").unwrap().size, 512.0);
    }

    #[test]
    fn parses_percentages() {
        assert_eq!(
            parse_threshold("10%").unwrap(),
            ThresholdValue {
                size: 10.0,
                kind: ThresholdKind::Percent
            }
        );
        assert_eq!(parse_threshold(" 100 % ").unwrap().size, 100.0);
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        assert!(parse_threshold("0%").is_err());
        assert!(parse_threshold("101%").is_err());
    }

    #[test]
    fn rejects_unknown_grammar() {
        for input in ["abc", "", "kB", ".kB", "10", "10 MB", "-5%", "-1kB", "1.5%"] {
            assert!(parse_threshold(input).is_err(), "{input:?} should fail");
        }
    }

    #[test]
    fn error_names_the_input() {
        let err = parse_threshold("abc").unwrap_err();
        assert_eq!(err.input, "abc");
        assert!(err.to_string().contains("invalid threshold \"abc\""));
    }

    #[test]
    fn from_str_delegates_to_parser() {
        let t: ThresholdValue = "2kB".parse().unwrap();
        assert_eq!(t.size, 2048.0);
    }
}

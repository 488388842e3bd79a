// src/config/duration.rs

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Parse a wait duration such as `"250ms"`, `"3s"`, `"1m"` or `"2h"`.
///
/// The unit is mandatory and case-insensitive; whitespace between the number
/// and the unit is allowed. Values that overflow a `u64` count of seconds
/// are rejected.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);

    if digits.is_empty() {
        return Err(format!("duration '{s}' must start with a number"));
    }
    let unit = unit.trim();
    if unit.is_empty() {
        return Err(format!("duration '{s}' is missing a unit (ms, s, m or h)"));
    }

    let value: u64 = digits
        .parse()
        .map_err(|e| format!("invalid duration number '{digits}': {e}"))?;

    let secs_per_unit = match unit.to_ascii_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        other => {
            return Err(format!(
                "unsupported duration unit '{other}'; expected ms, s, m or h"
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}

/// `serde` adapter for optional duration strings.
pub(crate) fn deserialize_opt_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| parse_duration(&s).map_err(<D::Error as serde::de::Error>::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_duration("10ms"), Ok(Duration::from_millis(10)));
        assert_eq!(parse_duration(" 1s "), Ok(Duration::from_secs(1)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("15").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("3d").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn accepts_space_before_unit() {
        assert_eq!(parse_duration("5 MS"), Ok(Duration::from_millis(5)));
    }

    #[test]
    fn overflowing_durations_are_errors() {
        let err = parse_duration("6000000000000000000h").unwrap_err();
        assert!(err.contains("too large"), "{err}");
        assert!(parse_duration("307445734561825861m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }
}

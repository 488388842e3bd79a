// src/exec/environ.rs

//! Helpers over an ordered `KEY=VALUE` environment list.
//!
//! The list keeps insertion order, and lookups are linear scans.

fn key_of(entry: &str) -> &str {
    entry.split_once('=').map(|(k, _)| k).unwrap_or(entry)
}

pub fn has(environ: &[String], key: &str) -> bool {
    environ.iter().any(|e| key_of(e) == key)
}

/// Value of the first entry for `key`.
pub fn get<'a>(environ: &'a [String], key: &str) -> Option<&'a str> {
    environ
        .iter()
        .find(|e| key_of(e) == key)
        .map(|e| e.split_once('=').map(|(_, v)| v).unwrap_or(""))
}

/// Replace the first entry for `key`, or append one.
///
/// Returns `true` if an existing entry was replaced.
pub fn set(environ: &mut Vec<String>, key: &str, value: &str) -> bool {
    let entry = format!("{key}={value}");
    match environ.iter_mut().find(|e| key_of(e) == key) {
        Some(existing) => {
            *existing = entry;
            true
        }
        None => {
            environ.push(entry);
            false
        }
    }
}

/// Remove every entry for `key`. Returns whether anything was removed.
pub fn del(environ: &mut Vec<String>, key: &str) -> bool {
    let before = environ.len();
    environ.retain(|e| key_of(e) != key);
    environ.len() != before
}

/// Split entries into `(key, value)` pairs for `Command::envs`.
///
/// Entries without `=` are passed with an empty value.
pub fn pairs(environ: &[String]) -> impl Iterator<Item = (&str, &str)> {
    environ
        .iter()
        .filter(|e| !key_of(e).is_empty())
        .map(|e| e.split_once('=').unwrap_or((e.as_str(), "")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn set_replaces_in_place_and_appends_otherwise() {
        let mut e = env(&["A=1", "B=2"]);
        assert!(set(&mut e, "A", "9"));
        assert!(!set(&mut e, "C", "3"));
        assert_eq!(e, env(&["A=9", "B=2", "C=3"]));
    }

    #[test]
    fn del_removes_every_duplicate() {
        let mut e = env(&["A=1", "B=2", "A=3"]);
        assert!(del(&mut e, "A"));
        assert!(!del(&mut e, "A"));
        assert_eq!(e, env(&["B=2"]));
    }

    #[test]
    fn get_returns_first_match_and_keeps_equals_in_value() {
        let e = env(&["URL=a=b", "URL=second", "FLAG"]);
        assert_eq!(get(&e, "URL"), Some("a=b"));
        assert_eq!(get(&e, "FLAG"), Some(""));
        assert!(has(&e, "FLAG"));
        assert_eq!(get(&e, "URLX"), None);
    }

    #[test]
    fn pairs_skip_empty_keys() {
        let e = env(&["=weird", "A=1", "B"]);
        let got: Vec<_> = pairs(&e).collect();
        assert_eq!(got, vec![("A", "1"), ("B", "")]);
    }
}

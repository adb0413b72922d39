//! Search regex filtering (§4.9): compiles one search target into a
//! case-insensitive, newline-aware regex for the aggregator (C8), and picks
//! the substring of that target the registry's own `search` RPC should be
//! called with. When more than one target is given, the aggregator applies
//! each target's regex in turn as a narrowing filter.
use regex::{Regex, RegexBuilder};

/// Compile `target` the way the aggregator's post-filter does: extended,
/// case-insensitive, `.` does not match `\n` by default in the `regex`
/// crate, which matches the "newline-aware" requirement as-is. No
/// subexpression capture is needed since only `is_match` is ever called.
pub fn compile_filter(target: &str) -> Option<Regex> {
    RegexBuilder::new(target)
        .case_insensitive(true)
        .build()
        .ok()
}

/// The registry's `search` RPC rejects very short or metacharacter-heavy
/// queries, so the actual network call uses the longest contiguous
/// substring of the user's target that contains no regex metacharacter and
/// is at least two characters — the full (possibly regex-flavored) target
/// is still applied locally via `compile_filter` against the broader
/// result set this returns.
pub fn registry_prefilter(target: &str) -> Option<&str> {
    const METACHARS: &[char] = &[
        '.', '^', '$', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '\\',
    ];

    let mut best: Option<(usize, usize)> = None;
    let mut start = 0usize;
    let chars: Vec<(usize, char)> = target.char_indices().collect();

    let mut i = 0;
    while i <= chars.len() {
        let boundary = i == chars.len() || METACHARS.contains(&chars[i].1);
        if boundary {
            let end_byte = if i == chars.len() {
                target.len()
            } else {
                chars[i].0
            };
            let start_byte = if start == chars.len() { target.len() } else { chars[start].0 };
            let len = i - start;
            if len >= 2 {
                let candidate_len = end_byte - start_byte;
                let better = match best {
                    Some((_, best_len)) => candidate_len > best_len,
                    None => true,
                };
                if better {
                    best = Some((start_byte, candidate_len));
                }
            }
            start = i + 1;
        }
        i += 1;
    }

    best.map(|(start_byte, len)| &target[start_byte..start_byte + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefilter_picks_longest_plain_run() {
        assert_eq!(registry_prefilter("fire.+fox"), Some("fire"));
        assert_eq!(registry_prefilter("^firefox$"), Some("firefox"));
        assert_eq!(registry_prefilter("fox"), Some("fox"));
    }

    #[test]
    fn prefilter_rejects_too_short_runs() {
        assert_eq!(registry_prefilter("a.b"), None);
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let re = compile_filter("FireFox").unwrap();
        assert!(re.is_match("mozilla-firefox"));
    }

    #[test]
    fn invalid_pattern_is_silently_dropped() {
        assert!(compile_filter("a(b").is_none());
    }
}

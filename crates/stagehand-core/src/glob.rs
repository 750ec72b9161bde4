//! Segment-wise glob matching for archive extraction paths
//!
//! Patterns are `/`-separated. Two wildcard forms are understood:
//! - `*` matches any run of characters within a single segment (it never
//!   crosses a `/`), so `*.yaml` matches `config.yaml` but not
//!   `dir/config.yaml`
//! - a trailing `**` matches zero or more remaining segments
//!
//! `**` anywhere except the final segment is a syntax error, rejected
//! eagerly when the pattern is constructed rather than at match time.

use crate::error::{ConfigError, Result};

/// Validate `**` placement in a glob pattern
///
/// Splits the pattern on `/` and rejects any non-final segment equal to
/// the literal `**` token. Other wildcard characters (`*`, `?`) are not
/// interpreted here.
pub fn validate(pattern: &str) -> Result<()> {
    let segments: Vec<&str> = pattern.split('/').collect();
    for segment in &segments[..segments.len() - 1] {
        if *segment == "**" {
            return Err(ConfigError::InvalidGlobSyntax {
                pattern: pattern.to_string(),
                message: "`**` may only appear as the final segment".to_string(),
            });
        }
    }
    Ok(())
}

/// Match a candidate path against a validated pattern
///
/// Returns the candidate's segments split at the point where the fixed
/// part of the pattern ends, or `None` if the candidate does not match:
/// - for a trailing-`**` pattern the tail is every segment below the
///   matched prefix (possibly empty);
/// - otherwise the tail is the candidate's final segment.
///
/// The pattern must already have passed [`validate`].
pub(crate) fn match_segments<'a>(pattern: &str, candidate: &'a str) -> Option<Vec<&'a str>> {
    let pat: Vec<&str> = pattern.split('/').collect();
    let cand: Vec<&str> = candidate.split('/').collect();

    let trailing_globstar = pat.last() == Some(&"**");
    let fixed = if trailing_globstar {
        &pat[..pat.len() - 1]
    } else {
        &pat[..]
    };

    if trailing_globstar {
        if cand.len() < fixed.len() {
            return None;
        }
    } else if cand.len() != fixed.len() {
        return None;
    }

    for (p, c) in fixed.iter().zip(cand.iter()) {
        if !segment_matches(p, c) {
            return None;
        }
    }

    if trailing_globstar {
        Some(cand[fixed.len()..].to_vec())
    } else {
        // Literal and `*` patterns rewrite only the final segment.
        Some(cand[cand.len() - 1..].to_vec())
    }
}

/// Match one pattern segment against one candidate segment
///
/// `*` matches any run of characters; everything else is literal.
/// Iterative backtracking over the star positions, linear in practice.
fn segment_matches(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < txt.len() {
        if p < pat.len() && pat[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if p < pat.len() && pat[p] == txt[t] {
            p += 1;
            t += 1;
        } else if let Some((sp, st)) = star {
            // Backtrack: let the last star consume one more character.
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trailing_globstar() {
        assert!(validate("a/b/**").is_ok());
        assert!(validate("**").is_ok());
        assert!(validate("a/*/c").is_ok());
        assert!(validate("plain/path.yaml").is_ok());
    }

    #[test]
    fn test_validate_rejects_inner_globstar() {
        let err = validate("a/**/b").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGlobSyntax { .. }));
        assert!(validate("**/b").is_err());
    }

    #[test]
    fn test_literal_matches_only_itself() {
        assert!(match_segments("a/b/c", "a/b/c").is_some());
        assert!(match_segments("a/b/c", "a/b/d").is_none());
        assert!(match_segments("a/b/c", "a/b").is_none());
        assert!(match_segments("a/b/c", "a/b/c/d").is_none());
    }

    #[test]
    fn test_star_matches_one_segment() {
        assert!(match_segments("a/*/c", "a/b/c").is_some());
        assert!(match_segments("a/*/c", "a/b/d/c").is_none());
        assert!(match_segments("*", "file.yaml").is_some());
        assert!(match_segments("*", "dir/file.yaml").is_none());
    }

    #[test]
    fn test_globstar_matches_any_suffix() {
        assert_eq!(
            match_segments("logs/**", "logs/app/error.log"),
            Some(vec!["app", "error.log"])
        );
        // The empty suffix matches too.
        assert_eq!(match_segments("logs/**", "logs"), Some(vec![]));
        assert!(match_segments("logs/**", "bin/app").is_none());
    }

    #[test]
    fn test_star_within_segment() {
        assert!(segment_matches("*.yaml", "config.yaml"));
        assert!(!segment_matches("*.yaml", "config.yml"));
        assert!(segment_matches("app-*-release", "app-1.2-release"));
        assert!(segment_matches("*", "anything"));
        assert!(match_segments("*.yaml", "config.yaml").is_some());
        assert!(match_segments("*.yaml", "dir/config.yaml").is_none());
    }

    #[test]
    fn test_bare_globstar_matches_everything() {
        assert_eq!(
            match_segments("**", "deep/nested/file"),
            Some(vec!["deep", "nested", "file"])
        );
    }
}

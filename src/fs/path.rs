/// Split a path into its segments, collapsing empty segments from
/// repeated slashes. `.` and `..` are kept; they are navigational and
/// handled during resolution.
pub fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// A name is invalid when it is empty or contains only whitespace.
pub fn is_invalid_name(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_collapses_empty_segments() {
        assert_eq!(split("/a//b/"), vec!["a", "b"]);
        assert_eq!(split("a/./../b"), vec!["a", ".", "..", "b"]);
        assert!(split("/").is_empty());
        assert!(split("").is_empty());
    }

    #[test]
    fn whitespace_only_names_are_invalid() {
        assert!(is_invalid_name(""));
        assert!(is_invalid_name("   "));
        assert!(is_invalid_name("\t"));
        assert!(!is_invalid_name("file.txt"));
    }
}

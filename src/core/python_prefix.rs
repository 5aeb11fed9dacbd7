// src/core/python_prefix.rs

//! Merging of python install prefixes.
//!
//! The compiled-in list and the user's list are both colon-separated. The
//! result is deduplicated and always enumerated in lexicographic order, so the
//! same inputs give the same string no matter how they were ordered.

use crate::constants::PREFIX_SEPARATOR;
use std::collections::BTreeSet;

/// Adds every non-empty segment of `list` to `prefixes`.
pub fn extend_from_list(prefixes: &mut BTreeSet<String>, list: &str) {
    prefixes.extend(
        list.split(PREFIX_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string),
    );
}

/// Merges the default list with the optional user list.
pub fn merge(default_list: &str, user_list: Option<&str>) -> BTreeSet<String> {
    let mut prefixes = BTreeSet::new();
    extend_from_list(&mut prefixes, default_list);
    if let Some(list) = user_list {
        extend_from_list(&mut prefixes, list);
    }
    prefixes
}

/// Joins a prefix set with `:`. An empty set gives an empty string.
pub fn join(prefixes: &BTreeSet<String>) -> String {
    prefixes
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(PREFIX_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_deduplicates() {
        let merged = merge("/a:/b", Some("/b:/c"));
        assert_eq!(join(&merged), "/a:/b:/c");
    }

    #[test]
    fn test_order_is_lexicographic_not_input_order() {
        let merged = merge("/usr:/opt/python", Some("/home/me/py:/aaa"));
        assert_eq!(join(&merged), "/aaa:/home/me/py:/opt/python:/usr");
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        let merged = merge("::/a::", Some(":/b:"));
        assert_eq!(merged.len(), 2);
        assert_eq!(join(&merged), "/a:/b");
    }

    #[test]
    fn test_no_user_list() {
        assert_eq!(join(&merge("/usr", None)), "/usr");
    }

    #[test]
    fn test_empty_inputs_give_empty_string() {
        assert_eq!(join(&merge("", Some(""))), "");
    }
}

//! Correlating pull requests with stories and members.
//!
//! This module provides the filtering and grouping helpers the report
//! pipeline runs over the flat lists returned by the APIs.

/// Extract a Clubhouse story id from a branch name.
///
/// Finds the first `ch<digits>` token bounded by non-word characters, so
/// `feature/ch123-login` gives 123 while `branch123` and `ch12a` give none.
pub fn story_id_from_branch(branch: &str) -> Option<u64> {
    for (start, _) in branch.match_indices("ch") {
        if branch[..start].chars().next_back().is_some_and(is_word_char) {
            continue;
        }

        let digits_start = start + 2;
        let rest = &branch[digits_start..];
        let digits_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits_len == 0 {
            continue;
        }

        let digits_end = digits_start + digits_len;
        if branch[digits_end..].chars().next().is_some_and(is_word_char) {
            continue;
        }

        if let Ok(id) = branch[digits_start..digits_end].parse() {
            return Some(id);
        }
    }

    None
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Sort items by author login, keeping API order within an author.
pub fn sort_by_author<T, F>(items: &mut [T], author: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| author(a).cmp(author(b)));
}

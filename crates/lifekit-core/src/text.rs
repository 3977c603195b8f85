/// Case-insensitive substring match of `query` against any of `fields`.
pub fn matches_any<'a>(query: &str, fields: impl IntoIterator<Item = &'a str>) -> bool {
    let needle = query.to_lowercase();
    fields
        .into_iter()
        .any(|f| f.to_lowercase().contains(&needle))
}

/// Lowercase, trim and dedupe tags. Each input may itself be comma-separated.
pub fn normalize_tags<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for chunk in raw {
        for tag in chunk.as_ref().split(',') {
            let tag = tag.trim().trim_start_matches('#').to_lowercase();
            if !tag.is_empty() && !out.contains(&tag) {
                out.push(tag);
            }
        }
    }
    out
}

pub fn has_tag(tags: &[String], tag: &str) -> bool {
    let tag = tag.trim().trim_start_matches('#').to_lowercase();
    tags.iter().any(|t| *t == tag)
}

/// Shorten `s` to at most `max` characters, ending in `…` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    if first_line.chars().count() <= max && first_line.len() == s.len() {
        return s.to_string();
    }
    let cut: String = first_line.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

/// Join positional words into one non-empty string.
pub fn join_words(words: &[String]) -> Option<String> {
    let joined = words.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_is_case_insensitive_substring() {
        assert!(matches_any("MILK", ["buy milk", "x"]));
        assert!(matches_any("ilk", ["Buy Milk"]));
        assert!(!matches_any("bread", ["buy milk"]));
    }

    #[test]
    fn tags_are_normalized() {
        let tags = normalize_tags(&["Work, #Home", "work", " ", "errands"]);
        assert_eq!(tags, vec!["work", "home", "errands"]);
        assert!(has_tag(&tags, "#HOME"));
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long sentence here", 6), "a lon…");
        assert_eq!(truncate("line one\nline two", 20), "line one…");
    }

    #[test]
    fn join_words_rejects_blank() {
        assert_eq!(join_words(&["  ".to_string()]), None);
        assert_eq!(
            join_words(&["buy".to_string(), "milk".to_string()]).as_deref(),
            Some("buy milk")
        );
    }
}

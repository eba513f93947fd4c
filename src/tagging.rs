use std::collections::BTreeSet;

/// Lowercase `raw` and strip every whitespace character.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parse a comma separated tag string into its canonical set.
///
/// Empty tokens are dropped and duplicates collapse into one.
pub fn parse_tags(input: &str) -> BTreeSet<String> {
    normalize(input)
        .split(',')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render tags back into the form field format, e.g. `"go, python"`.
pub fn join_tags<'a>(tags: impl IntoIterator<Item = &'a String>) -> String {
    tags.into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_dedupes_and_drops_empties() {
        let tags = parse_tags("Go, GO ,python,,python");
        let expected: BTreeSet<String> = ["go", "python"].into_iter().map(String::from).collect();
        assert_eq!(tags, expected);
    }

    #[test]
    fn strips_inner_whitespace() {
        let tags = parse_tags("machine learning,\tweb dev\n");
        assert!(tags.contains("machinelearning"));
        assert!(tags.contains("webdev"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn normalize_folds_case_and_whitespace() {
        assert_eq!(normalize("Web Dev"), "webdev");
        assert_eq!(normalize(" \t"), "");
    }

    #[test]
    fn blank_input_yields_no_tags() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ,, ").is_empty());
    }

    #[test]
    fn join_is_sorted_and_comma_separated() {
        let tags = parse_tags("rust, async, Rust");
        assert_eq!(join_tags(&tags), "async, rust");
    }
}

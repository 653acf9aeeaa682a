/// First line of `text`, trimmed. Empty input gives an empty string.
pub fn first_line(text: &str) -> &str {
    text.trim().lines().next().unwrap_or("").trim()
}

/// Remove any of `prefixes` from the start of `text`, ignoring case.
/// Prefixes are applied in order, so stacked labels are all removed.
pub fn strip_unwanted_prefixes<S: AsRef<str>>(text: &str, prefixes: &[S]) -> String {
    let mut result = text.trim();

    for prefix in prefixes {
        let prefix = prefix.as_ref();
        if prefix.is_empty() {
            continue;
        }
        // Compare by characters; lowercasing can change byte lengths.
        let prefix_chars = prefix.chars().count();
        let end = result
            .char_indices()
            .nth(prefix_chars)
            .map(|(i, _)| i)
            .unwrap_or(result.len());
        if result[..end].chars().count() == prefix_chars
            && result[..end].to_lowercase() == prefix.to_lowercase()
        {
            result = result[end..].trim();
        }
    }

    result.to_string()
}

/// Replace every occurrence of the original hotel name with the new title.
pub fn replace_hotel_name(description: &str, original: &str, rewritten: &str) -> String {
    if original.is_empty() {
        return description.to_string();
    }
    description.replace(original, rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIXES: [&str; 3] = ["New hotel name:", "TITLE:", "Rewritten:"];

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("  Sea Breeze Inn\nThis name evokes...  "), "Sea Breeze Inn");
        assert_eq!(first_line(""), "");
        assert_eq!(first_line("\n\n"), "");
    }

    #[test]
    fn test_strip_prefix_ignores_case() {
        assert_eq!(strip_unwanted_prefixes("new HOTEL name: Azure Palms", &PREFIXES), "Azure Palms");
        assert_eq!(strip_unwanted_prefixes("Title:  Azure Palms ", &PREFIXES), "Azure Palms");
        assert_eq!(strip_unwanted_prefixes("Azure Palms", &PREFIXES), "Azure Palms");
    }

    #[test]
    fn test_strip_prefix_handles_short_and_multibyte_text() {
        assert_eq!(strip_unwanted_prefixes("Hôtel", &PREFIXES), "Hôtel");
        assert_eq!(strip_unwanted_prefixes("TITLE:", &PREFIXES), "");
    }

    #[test]
    fn test_strip_prefix_folds_non_ascii_case() {
        assert_eq!(strip_unwanted_prefixes("HÔTEL: Azure Palms", &["Hôtel:"]), "Azure Palms");
        assert_eq!(strip_unwanted_prefixes("ÉTOILE Azure", &["étoile"]), "Azure");
        assert_eq!(strip_unwanted_prefixes("Hôt", &["Hôtel:"]), "Hôt");
    }

    #[test]
    fn test_replace_hotel_name() {
        assert_eq!(
            replace_hotel_name("Stay at Old Inn. Old Inn is great.", "Old Inn", "Azure Palms"),
            "Stay at Azure Palms. Azure Palms is great."
        );
        assert_eq!(replace_hotel_name("unchanged", "", "x"), "unchanged");
    }
}

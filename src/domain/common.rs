/// Surrogate key assigned by the store.
pub type DebtorId = i64;

/// Exposes the store-assigned identifier of an entity.
pub trait Identifiable {
    fn id(&self) -> DebtorId;
}

/// Provides a short label for lists and confirmation prompts.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Normalizes an external person identifier for uniqueness checks: whitespace is removed
/// and letters are lowercased, so ` AB 12` and `ab12` collide.
pub fn normalize_person_key(raw: &str) -> Option<String> {
    let key: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Trims optional free text, collapsing blank values to `None`.
pub fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_key_ignores_case_and_spaces() {
        assert_eq!(normalize_person_key(" AB 12 "), Some("ab12".into()));
        assert_eq!(normalize_person_key("ab12"), normalize_person_key("Ab 1 2"));
        assert_eq!(normalize_person_key("   "), None);
    }

    #[test]
    fn clean_optional_drops_blank_text() {
        assert_eq!(clean_optional(Some("  ")), None);
        assert_eq!(clean_optional(Some(" 555 ")), Some("555".into()));
        assert_eq!(clean_optional(None), None);
    }
}

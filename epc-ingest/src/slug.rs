//! Slug derivation
//!
//! A slug is the deduplication key for organizations and programs:
//! lowercase, every run of non-alphanumeric characters collapsed to a single
//! hyphen, leading and trailing hyphens trimmed.

/// Derive the slug for a display name
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_dash = false;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_share_slug() {
        assert_eq!(slugify("Fred Hutch SHIP"), "fred-hutch-ship");
        assert_eq!(slugify("fred-hutch-ship  "), "fred-hutch-ship");
        assert_eq!(slugify("  Fred   Hutch -- SHIP!"), "fred-hutch-ship");
    }

    #[test]
    fn test_punctuation_only_is_empty() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_non_ascii_letters_kept() {
        assert_eq!(slugify("Universidad de los Andes – Bogotá"), "universidad-de-los-andes-bogotá");
    }
}

//! Category classifier
//!
//! Case-insensitive keyword rules over subject and name text. Rules are
//! evaluated in order; the first match becomes the primary category. A match
//! on any STEM subject also tags the `stem` parent. Text matching nothing is
//! tagged with the `high-school` demographic.
//!
//! Keywords of three letters or fewer (`ai`, `art`) must match a whole word,
//! so "ai" does not fire on "Hawaii".

use epc_common::db::models::CategoryType;

/// One rule: keywords that imply a category
struct CategoryRule {
    slug: &'static str,
    category_type: CategoryType,
    keywords: &'static [&'static str],
    stem: bool,
}

const fn subject(slug: &'static str, keywords: &'static [&'static str], stem: bool) -> CategoryRule {
    CategoryRule {
        slug,
        category_type: CategoryType::Subject,
        keywords,
        stem,
    }
}

const fn demographic(slug: &'static str, keywords: &'static [&'static str]) -> CategoryRule {
    CategoryRule {
        slug,
        category_type: CategoryType::Demographic,
        keywords,
        stem: false,
    }
}

const RULES: &[CategoryRule] = &[
    subject(
        "computer-science",
        &["computer", "coding", "programming", "software", "ai", "artificial intelligence", "cyber"],
        true,
    ),
    subject("mathematics", &["math"], true),
    subject("engineering", &["engineering", "robotics"], true),
    subject("biology", &["biology", "biomedical", "genetics", "neuroscience"], true),
    subject("chemistry", &["chemistry", "chemical"], true),
    subject("physics", &["physics", "astronomy", "astrophysics"], true),
    subject(
        "environmental-science",
        &["environmental", "ecology", "climate", "sustainability"],
        true,
    ),
    subject("research", &["research"], false),
    subject("leadership", &["leadership"], false),
    subject("business", &["business", "entrepreneur", "finance", "economics"], false),
    subject("humanities", &["humanities", "history", "philosophy", "writing", "literature"], false),
    subject("arts", &["arts", "art", "music", "theater", "design"], false),
    demographic("women-in-stem", &["women", "girls"]),
    demographic("underrepresented", &["underrepresented", "first-generation", "low-income"]),
];

/// Slug of the STEM root category
pub const STEM_SLUG: &str = "stem";

/// Demographic used when nothing matches
pub const FALLBACK_SLUG: &str = "high-school";

const WHOLE_WORD_MAX_LEN: usize = 3;

/// Category inferred for a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMatch {
    pub slug: &'static str,
    pub category_type: CategoryType,
    pub is_primary: bool,
}

fn keyword_matches(lower: &str, words: &[&str], keyword: &str) -> bool {
    if keyword.len() <= WHOLE_WORD_MAX_LEN {
        words.contains(&keyword)
    } else {
        lower.contains(keyword)
    }
}

/// Classify subject/keyword text into taxonomy categories
///
/// The result is never empty and holds exactly one primary match.
pub fn classify(text: &str) -> Vec<CategoryMatch> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut matches: Vec<CategoryMatch> = Vec::new();
    let mut stem = false;

    for rule in RULES {
        if rule.keywords.iter().any(|k| keyword_matches(&lower, &words, k)) {
            matches.push(CategoryMatch {
                slug: rule.slug,
                category_type: rule.category_type,
                is_primary: matches.is_empty(),
            });
            stem |= rule.stem;
        }
    }

    if stem {
        matches.push(CategoryMatch {
            slug: STEM_SLUG,
            category_type: CategoryType::Subject,
            is_primary: false,
        });
    }

    if matches.is_empty() {
        matches.push(CategoryMatch {
            slug: FALLBACK_SLUG,
            category_type: CategoryType::Demographic,
            is_primary: true,
        });
    }

    matches
}

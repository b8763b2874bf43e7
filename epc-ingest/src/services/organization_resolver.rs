//! Organization resolver
//!
//! Derives a canonical organization from free text that names it (the
//! organization field, or the program name when that is empty) and maps it
//! to a stored organization, creating one on first sight.
//!
//! Extraction rules are tried in a fixed order and the first candidate
//! longer than two characters wins:
//!
//! 1. leading all-caps acronym token (`MIT MITES` -> `MIT`)
//! 2. name before a program keyword (`Stanford Summer Session` -> `Stanford`)
//! 3. hyphen-delimited leading segment (`Garcia Center - Polymers` -> `Garcia Center`)
//! 4. first words: three when the text has four or more, else two
//!
//! If no rule produces a usable candidate the whole text is used.
//!
//! Identity is the slug of the candidate. Resolutions are remembered in an
//! [`OrganizationCache`] owned by the caller for the length of one run.

use crate::db::organizations;
use crate::error::{IngestError, IngestResult};
use crate::models::{NormalizedRecord, OrganizationDraft};
use crate::normalize::website_origin;
use crate::slug::slugify;
use crate::utils::retry_on_lock;
use epc_common::db::models::OrganizationType;
use regex::Regex;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Extraction rule that produced an organization name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRule {
    LeadingAcronym,
    NameBeforeKeyword,
    HyphenSegment,
    LeadingWords,
    WholeText,
}

/// Rule order; earlier rules win
pub const EXTRACTION_ORDER: [ExtractionRule; 4] = [
    ExtractionRule::LeadingAcronym,
    ExtractionRule::NameBeforeKeyword,
    ExtractionRule::HyphenSegment,
    ExtractionRule::LeadingWords,
];

const MIN_CANDIDATE_CHARS: usize = 3;

const TRIM_CHARS: &[char] = &[',', '.', ';', ':', '(', ')', '"', '\''];

fn acronym_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9&]+$").ok()).as_ref()
}

fn keyword_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(.+?)\s+(?:summer|programs?|school|institute|academy|camp|scholars|research|internship|fellowship|initiative)\b",
        )
        .ok()
    })
    .as_ref()
}

fn hyphen_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+[-–—]\s+").ok()).as_ref()
}

fn apply_rule(rule: ExtractionRule, text: &str) -> Option<String> {
    let candidate = match rule {
        ExtractionRule::LeadingAcronym => {
            let token = text.split_whitespace().next()?.trim_matches(TRIM_CHARS);
            acronym_regex()?.is_match(token).then(|| token.to_string())
        }
        ExtractionRule::NameBeforeKeyword => keyword_regex()?
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()),
        ExtractionRule::HyphenSegment => {
            let separator = hyphen_regex()?.find(text)?;
            Some(text[..separator.start()].to_string())
        }
        ExtractionRule::LeadingWords => {
            let words: Vec<&str> = text.split_whitespace().collect();
            let take = if words.len() >= 4 { 3 } else { 2 };
            Some(words.iter().take(take).copied().collect::<Vec<_>>().join(" "))
        }
        ExtractionRule::WholeText => Some(text.to_string()),
    }?;

    let candidate = candidate.trim().trim_matches(TRIM_CHARS).trim();
    (candidate.chars().count() >= MIN_CANDIDATE_CHARS && !slugify(candidate).is_empty())
        .then(|| candidate.to_string())
}

/// Extract the organization name from free text
///
/// Returns None only when the text has no letters or digits at all.
pub fn extract_organization_name(text: &str) -> Option<(ExtractionRule, String)> {
    let text = text.trim();
    EXTRACTION_ORDER
        .iter()
        .find_map(|rule| apply_rule(*rule, text).map(|name| (*rule, name)))
        .or_else(|| (!slugify(text).is_empty()).then(|| (ExtractionRule::WholeText, text.to_string())))
}

const UNIVERSITY_KEYWORDS: &[&str] = &["university", "college", "institute of technology"];
const GOVERNMENT_KEYWORDS: &[&str] = &[
    "department",
    "national laboratory",
    "government",
    "federal",
];
const GOVERNMENT_ACRONYMS: &[&str] = &["nasa", "nih", "noaa", "nsf"];
const NONPROFIT_KEYWORDS: &[&str] = &[
    "foundation",
    "society",
    "association",
    "nonprofit",
    "non-profit",
    "alliance",
    "council",
    "club",
];

/// Infer the organization type from the text naming it
pub fn infer_organization_type(text: &str) -> OrganizationType {
    let lower = text.to_lowercase();
    let has_word = |word: &str| {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token == word)
    };

    if UNIVERSITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        OrganizationType::University
    } else if GOVERNMENT_ACRONYMS.iter().any(|&k| has_word(k))
        || GOVERNMENT_KEYWORDS.iter().any(|k| lower.contains(k))
    {
        OrganizationType::Government
    } else if NONPROFIT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        OrganizationType::Nonprofit
    } else {
        OrganizationType::Organization
    }
}

/// Build the organization to find or create for a normalized record
///
/// The website is the origin of the program website. The country is only set
/// alongside a known city or state. Returns None when the organization text
/// has no usable characters.
pub fn draft_organization(record: &NormalizedRecord, default_country: &str) -> Option<OrganizationDraft> {
    let (rule, name) = extract_organization_name(&record.organization_source)?;
    debug!(
        source = %record.organization_source,
        organization = %name,
        rule = ?rule,
        "Extracted organization name"
    );

    Some(OrganizationDraft {
        slug: slugify(&name),
        org_type: infer_organization_type(&record.organization_source),
        website: record.website.as_deref().and_then(website_origin),
        city: record.city.clone(),
        state: record.state.clone(),
        country: (record.city.is_some() || record.state.is_some())
            .then(|| default_country.to_string()),
        name,
    })
}

/// Cached resolution of one slug
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrganizationRef {
    pub id: Uuid,
    /// False for a placeholder id whose insert failed
    pub persisted: bool,
}

/// Run-scoped map from organization slug to resolved id
///
/// Owned by the orchestrator and passed to each resolution; a single task
/// reads and writes it.
#[derive(Debug, Default)]
pub struct OrganizationCache {
    entries: HashMap<String, OrganizationRef>,
}

impl OrganizationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slug: &str) -> Option<OrganizationRef> {
        self.entries.get(slug).copied()
    }

    pub fn insert(&mut self, slug: impl Into<String>, reference: OrganizationRef) {
        self.entries.insert(slug.into(), reference);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slugs whose organization could not be stored
    pub fn placeholders(&self) -> Vec<&str> {
        let mut slugs: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, reference)| !reference.persisted)
            .map(|(slug, _)| slug.as_str())
            .collect();
        slugs.sort_unstable();
        slugs
    }
}

/// How an organization was resolved
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Found in the run cache
    Cached(Uuid),
    /// Found in the store
    Existing(Uuid),
    /// Inserted by this resolution
    Created(Uuid),
    /// Insert failed; the id exists only in the cache
    Placeholder { id: Uuid, error: String },
}

impl Resolution {
    pub fn id(&self) -> Uuid {
        match self {
            Resolution::Cached(id)
            | Resolution::Existing(id)
            | Resolution::Created(id)
            | Resolution::Placeholder { id, .. } => *id,
        }
    }

    pub fn is_persisted(&self) -> bool {
        !matches!(self, Resolution::Placeholder { .. })
    }
}

/// Find or create the organization for a draft
///
/// Entity-level storage failures yield [`Resolution::Placeholder`] and are
/// retried the next time the same slug is resolved. Connection-level
/// failures are returned as errors.
pub async fn resolve_organization(
    pool: &SqlitePool,
    cache: &mut OrganizationCache,
    draft: &OrganizationDraft,
    max_lock_wait_ms: u64,
) -> IngestResult<Resolution> {
    if let Some(reference) = cache.get(&draft.slug) {
        if reference.persisted {
            fill_missing(pool, reference.id, draft, max_lock_wait_ms).await?;
            return Ok(Resolution::Cached(reference.id));
        }
    }

    match find_or_insert(pool, draft, max_lock_wait_ms).await {
        Ok((id, created)) => {
            cache.insert(draft.slug.clone(), OrganizationRef { id, persisted: true });
            if created {
                debug!(slug = %draft.slug, id = %id, "Created organization");
                Ok(Resolution::Created(id))
            } else {
                fill_missing(pool, id, draft, max_lock_wait_ms).await?;
                Ok(Resolution::Existing(id))
            }
        }
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            let id = match cache.get(&draft.slug) {
                Some(previous) => previous.id,
                None => Uuid::new_v4(),
            };
            warn!(
                slug = %draft.slug,
                placeholder = %id,
                error = %err,
                "Organization insert failed, using placeholder id"
            );
            cache.insert(draft.slug.clone(), OrganizationRef { id, persisted: false });
            Ok(Resolution::Placeholder {
                id,
                error: err.to_string(),
            })
        }
    }
}

async fn find_or_insert(
    pool: &SqlitePool,
    draft: &OrganizationDraft,
    max_lock_wait_ms: u64,
) -> IngestResult<(Uuid, bool)> {
    if let Some(existing) = organizations::load_organization_by_slug(pool, &draft.slug).await? {
        return Ok((existing.guid, false));
    }

    let guid = Uuid::new_v4();
    let inserted = retry_on_lock("organization insert", max_lock_wait_ms, || {
        organizations::insert_organization(pool, guid, draft)
    })
    .await?;

    if inserted {
        return Ok((guid, true));
    }

    // Lost a race on the slug; use the winner's row
    match organizations::load_organization_by_slug(pool, &draft.slug).await? {
        Some(existing) => Ok((existing.guid, false)),
        None => Err(IngestError::Persistence(format!(
            "organization {} neither inserted nor found",
            draft.slug
        ))),
    }
}

async fn fill_missing(
    pool: &SqlitePool,
    id: Uuid,
    draft: &OrganizationDraft,
    max_lock_wait_ms: u64,
) -> IngestResult<()> {
    if draft.website.is_none() && draft.city.is_none() && draft.state.is_none() {
        return Ok(());
    }

    let result = retry_on_lock("organization fill", max_lock_wait_ms, || {
        organizations::fill_missing_fields(pool, id, draft)
    })
    .await;

    match result {
        Ok(true) => {
            debug!(slug = %draft.slug, "Filled missing organization fields");
            Ok(())
        }
        Ok(false) => Ok(()),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            warn!(slug = %draft.slug, error = %err, "Could not fill organization fields");
            Ok(())
        }
    }
}

use std::collections::BTreeMap;

use harvester_core::{Field, FieldValue};
use url::Url;

use crate::locator::locators;
use crate::{FieldError, FieldResult, ItemNode, Locator};

/// Base for resolving relative links found inside posts.
const SITE_BASE: &str = "https://www.facebook.com/";

/// Extraction procedure for one field, applied to an item subtree.
pub type ExtractFn = fn(&mut dyn ItemNode) -> FieldResult;

/// Dispatch table from field identifiers to their extractors.
///
/// Adding a field means adding a `Field` variant and a table entry; the
/// exhaustive match in [`standard_extractor`] makes the second step mandatory.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    entries: BTreeMap<Field, ExtractFn>,
}

impl FieldRegistry {
    pub fn standard() -> Self {
        let entries = Field::ALL
            .into_iter()
            .map(|field| (field, standard_extractor(field)))
            .collect();
        Self { entries }
    }

    /// Replaces the extractor registered for `field`.
    pub fn with(mut self, field: Field, extractor: ExtractFn) -> Self {
        self.entries.insert(field, extractor);
        self
    }

    pub fn extractor(&self, field: Field) -> Option<ExtractFn> {
        self.entries.get(&field).copied()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_extractor(field: Field) -> ExtractFn {
    match field {
        Field::Author => extract_author,
        Field::AuthorUrl => extract_author_url,
        Field::Text => extract_text,
        Field::Timestamp => extract_timestamp,
        Field::Permalink => extract_permalink,
        Field::Reactions => extract_reactions,
        Field::Comments => extract_comments,
        Field::Shares => extract_shares,
        Field::Sponsored => extract_sponsored,
    }
}

fn extract_author(node: &mut dyn ItemNode) -> FieldResult {
    required_text(node, Field::Author, &locators::AUTHOR).map(FieldValue::Text)
}

fn extract_author_url(node: &mut dyn ItemNode) -> FieldResult {
    required_url(node, Field::AuthorUrl, &locators::AUTHOR_LINK)
}

fn extract_text(node: &mut dyn ItemNode) -> FieldResult {
    required_text(node, Field::Text, &locators::MESSAGE).map(FieldValue::Text)
}

/// Hovers the timestamp link first: the full date label is only rendered on hover.
fn extract_timestamp(node: &mut dyn ItemNode) -> FieldResult {
    let locator = locators::TIMESTAMP_LINK;
    node.reveal(&locator)?;
    let label = node
        .attr(&locator, "aria-label")?
        .map(|label| normalize_text(&label))
        .filter(|label| !label.is_empty());
    match label {
        Some(label) => Ok(FieldValue::Timestamp(label)),
        None => required_text(node, Field::Timestamp, &locator).map(FieldValue::Timestamp),
    }
}

fn extract_permalink(node: &mut dyn ItemNode) -> FieldResult {
    required_url(node, Field::Permalink, &locators::PERMALINK)
}

fn extract_reactions(node: &mut dyn ItemNode) -> FieldResult {
    let locator = locators::REACTION_COUNT;
    node.text(&locator)?
        .as_deref()
        .and_then(parse_count)
        .map(FieldValue::Count)
        .ok_or_else(|| FieldError::unavailable(Field::Reactions, &locator))
}

fn extract_comments(node: &mut dyn ItemNode) -> FieldResult {
    engagement_count(node, Field::Comments, &["comment", "comments"])
}

fn extract_shares(node: &mut dyn ItemNode) -> FieldResult {
    engagement_count(node, Field::Shares, &["share", "shares"])
}

/// Never unavailable: no marker means an organic post.
fn extract_sponsored(node: &mut dyn ItemNode) -> FieldResult {
    let marked = node.text(&locators::SPONSORED_MARKER)?.is_some();
    Ok(FieldValue::Flag(marked))
}

fn required_text(
    node: &mut dyn ItemNode,
    field: Field,
    locator: &Locator,
) -> Result<String, FieldError> {
    node.text(locator)?
        .map(|text| normalize_text(&text))
        .filter(|text| !text.is_empty())
        .ok_or_else(|| FieldError::unavailable(field, locator))
}

fn required_url(node: &mut dyn ItemNode, field: Field, locator: &Locator) -> FieldResult {
    node.attr(locator, "href")?
        .as_deref()
        .and_then(resolve_url)
        .map(FieldValue::Url)
        .ok_or_else(|| FieldError::unavailable(field, locator))
}

/// Reads counters such as "12 comments" from the engagement bar.
fn engagement_count(node: &mut dyn ItemNode, field: Field, nouns: &[&str]) -> FieldResult {
    let locator = locators::ENGAGEMENT;
    node.texts(&locator)?
        .iter()
        .find_map(|text| {
            let text = normalize_text(text).to_lowercase();
            let (count, noun) = text.rsplit_once(' ')?;
            if nouns.contains(&noun) {
                parse_count(count)
            } else {
                None
            }
        })
        .map(FieldValue::Count)
        .ok_or_else(|| FieldError::unavailable(field, &locator))
}

/// Collapses runs of whitespace inside each line and drops blank lines.
pub(crate) fn normalize_text(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn resolve_url(reference: &str) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    if trimmed.to_ascii_lowercase().starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    Url::parse(SITE_BASE).ok()?.join(trimmed).ok()
}

/// Parses compact counters as rendered by the feed: "12", "1,234", "1.2K", "3M".
pub fn parse_count(raw: &str) -> Option<u64> {
    let token = raw.split_whitespace().next()?.replace(',', "");
    let (number, multiplier) = match token.chars().last()?.to_ascii_uppercase() {
        'K' => (&token[..token.len() - 1], 1_000.0),
        'M' => (&token[..token.len() - 1], 1_000_000.0),
        'B' => (&token[..token.len() - 1], 1_000_000_000.0),
        _ => (token.as_str(), 1.0),
    };
    if number.contains('.') || multiplier > 1.0 {
        let value: f64 = number.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some((value * multiplier).round() as u64)
    } else {
        number.parse().ok()
    }
}

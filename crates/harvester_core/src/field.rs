use std::fmt;
use std::str::FromStr;

use url::Url;

/// Semantic attributes the harvester knows how to extract from a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Author,
    AuthorUrl,
    Text,
    Timestamp,
    Permalink,
    Reactions,
    Comments,
    Shares,
    Sponsored,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Author,
        Field::AuthorUrl,
        Field::Text,
        Field::Timestamp,
        Field::Permalink,
        Field::Reactions,
        Field::Comments,
        Field::Shares,
        Field::Sponsored,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Author => "author",
            Field::AuthorUrl => "author_url",
            Field::Text => "text",
            Field::Timestamp => "timestamp",
            Field::Permalink => "permalink",
            Field::Reactions => "reactions",
            Field::Comments => "comments",
            Field::Shares => "shares",
            Field::Sponsored => "sponsored",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field '{}'", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Field::ALL
            .into_iter()
            .find(|field| field.name() == wanted)
            .ok_or_else(|| UnknownField(s.trim().to_string()))
    }
}

/// Dedupes `requested` keeping first occurrences; an empty request means every field.
pub fn normalize_fields(requested: &[Field]) -> Vec<Field> {
    if requested.is_empty() {
        return Field::ALL.to_vec();
    }
    let mut fields = Vec::with_capacity(requested.len());
    for field in requested {
        if !fields.contains(field) {
            fields.push(*field);
        }
    }
    fields
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Count(u64),
    Url(Url),
    /// Timestamp label exactly as the page renders it.
    Timestamp(String),
    Flag(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) | FieldValue::Timestamp(text) => f.write_str(text),
            FieldValue::Count(count) => write!(f, "{count}"),
            FieldValue::Url(url) => f.write_str(url.as_str()),
            FieldValue::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

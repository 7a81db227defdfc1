use std::collections::BTreeMap;

use crate::{Field, FieldValue, Position};

/// One materialized feed item. Fields whose extractor found nothing are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    position: Position,
    fields: BTreeMap<Field, FieldValue>,
}

impl ItemRecord {
    pub fn new(position: Position, fields: BTreeMap<Field, FieldValue>) -> Self {
        Self { position, fields }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.fields.iter().map(|(field, value)| (*field, value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// An advertisement currently rendered in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarAd {
    pub text: String,
    pub link: String,
}

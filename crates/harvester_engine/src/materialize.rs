use std::collections::BTreeMap;

use engine_logging::{engine_debug, engine_warn};
use harvester_core::{normalize_fields, Field, ItemRecord, Position};

use crate::{FieldError, FieldRegistry, ItemNode, SessionError};

/// Builds the record for one item from the requested fields.
///
/// An empty `fields` slice requests every known field; duplicates are ignored.
/// Fields whose extractor reports them unavailable are left out of the record.
/// Only session failures abort.
pub fn materialize(
    node: &mut dyn ItemNode,
    position: Position,
    fields: &[Field],
    registry: &FieldRegistry,
) -> Result<ItemRecord, SessionError> {
    let mut values = BTreeMap::new();
    for field in normalize_fields(fields) {
        let Some(extractor) = registry.extractor(field) else {
            engine_warn!("No extractor registered for field {field}");
            continue;
        };
        match extractor(node) {
            Ok(value) => {
                values.insert(field, value);
            }
            Err(FieldError::Unavailable { locator, .. }) => {
                engine_debug!("Item {position}: {field} unavailable at '{locator}'");
            }
            Err(FieldError::Session(err)) => return Err(err),
        }
    }
    Ok(ItemRecord::new(position, values))
}

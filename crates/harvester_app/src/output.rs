//! JSON-lines rendering of harvested records.

use std::io::{self, Write};

use harvester_core::{FieldValue, ItemRecord, SidebarAd};
use serde_json::{json, Map, Value};

pub fn record_json(record: &ItemRecord) -> Value {
    let mut object = Map::new();
    object.insert("position".to_string(), json!(record.position()));
    for (field, value) in record.fields() {
        object.insert(field.name().to_string(), value_json(value));
    }
    Value::Object(object)
}

fn value_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(text) | FieldValue::Timestamp(text) => json!(text),
        FieldValue::Count(count) => json!(count),
        FieldValue::Url(url) => json!(url.as_str()),
        FieldValue::Flag(flag) => json!(flag),
    }
}

pub fn ad_json(ad: &SidebarAd) -> Value {
    json!({ "ad": { "text": ad.text, "link": ad.link } })
}

pub fn write_line(out: &mut impl Write, value: &Value) -> io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)
}

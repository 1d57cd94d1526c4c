//! Firestore REST value encoding.
//!
//! The REST API wraps every field in a single-key object naming its type,
//! e.g. `{"stringValue": "hello"}` or `{"integerValue": "42"}`. These
//! helpers unwrap that encoding into plain JSON.

use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// One typed Firestore value
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    NullValue(()),
    BooleanValue(bool),
    /// int64 values arrive as decimal strings
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FirestoreValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, FirestoreValue>,
}

impl FirestoreValue {
    /// Convert into plain JSON. Integers that do not fit an i64 are kept as strings.
    pub fn into_json(self) -> Value {
        match self {
            FirestoreValue::NullValue(()) => Value::Null,
            FirestoreValue::BooleanValue(b) => Value::Bool(b),
            FirestoreValue::IntegerValue(s) => match s.parse::<i64>() {
                Ok(n) => Value::Number(n.into()),
                Err(_) => Value::String(s),
            },
            FirestoreValue::DoubleValue(f) => float(f),
            FirestoreValue::TimestampValue(s)
            | FirestoreValue::StringValue(s)
            | FirestoreValue::BytesValue(s)
            | FirestoreValue::ReferenceValue(s) => Value::String(s),
            FirestoreValue::GeoPointValue(point) => {
                let mut map = Map::new();
                map.insert("latitude".to_string(), float(point.latitude));
                map.insert("longitude".to_string(), float(point.longitude));
                Value::Object(map)
            }
            FirestoreValue::ArrayValue(array) => Value::Array(
                array
                    .values
                    .into_iter()
                    .map(FirestoreValue::into_json)
                    .collect(),
            ),
            FirestoreValue::MapValue(map) => Value::Object(decode_fields(map.fields)),
        }
    }
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Decode a document's `fields` table
pub fn decode_fields(fields: BTreeMap<String, FirestoreValue>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key, value.into_json()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Value {
        serde_json::from_value::<FirestoreValue>(value)
            .unwrap()
            .into_json()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(decode(json!({"nullValue": null})), Value::Null);
        assert_eq!(decode(json!({"booleanValue": true})), json!(true));
        assert_eq!(decode(json!({"integerValue": "42"})), json!(42));
        assert_eq!(decode(json!({"doubleValue": 0.7})), json!(0.7));
        assert_eq!(decode(json!({"stringValue": "halo"})), json!("halo"));
        assert_eq!(
            decode(json!({"timestampValue": "2024-03-01T00:00:00Z"})),
            json!("2024-03-01T00:00:00Z")
        );
        assert_eq!(
            decode(json!({"referenceValue": "projects/p/databases/(default)/documents/blog/blogs"})),
            json!("projects/p/databases/(default)/documents/blog/blogs")
        );
    }

    #[test]
    fn test_oversized_integer_stays_string() {
        assert_eq!(
            decode(json!({"integerValue": "99999999999999999999"})),
            json!("99999999999999999999")
        );
    }

    #[test]
    fn test_geo_point() {
        assert_eq!(
            decode(json!({"geoPointValue": {"latitude": -6.2, "longitude": 106.8}})),
            json!({"latitude": -6.2, "longitude": 106.8})
        );
    }

    #[test]
    fn test_nested_blog_list() {
        let typed = json!({
            "arrayValue": {
                "values": [
                    {"mapValue": {"fields": {
                        "id": {"integerValue": "1"},
                        "slug": {"stringValue": "a"},
                        "publishDate": {"stringValue": "2024-01-01T00:00:00Z"}
                    }}},
                    {"mapValue": {"fields": {
                        "slug": {"stringValue": ""},
                        "publishDate": {"nullValue": null}
                    }}}
                ]
            }
        });

        assert_eq!(
            decode(typed),
            json!([
                {"id": 1, "slug": "a", "publishDate": "2024-01-01T00:00:00Z"},
                {"slug": "", "publishDate": null}
            ])
        );
    }

    #[test]
    fn test_empty_array_and_map() {
        assert_eq!(decode(json!({"arrayValue": {}})), json!([]));
        assert_eq!(decode(json!({"mapValue": {}})), json!({}));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_value::<FirestoreValue>(json!({"vectorValue": {}})).is_err());
    }
}

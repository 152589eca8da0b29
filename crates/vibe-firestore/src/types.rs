//! Firestore REST API types.
//!
//! Wire shapes for documents, commits and structured queries, plus the
//! conversion traits used by the repositories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FirestoreError, FirestoreResult};

/// Firestore document value types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

impl Value {
    /// Convert a JSON value into a Firestore value.
    ///
    /// Whole numbers become `integerValue`, other numbers `doubleValue`.
    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::NullValue(()),
            Json::Bool(b) => Value::BooleanValue(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::IntegerValue(i.to_string()),
                None => Value::DoubleValue(n.as_f64().unwrap_or(0.0)),
            },
            Json::String(s) => Value::StringValue(s),
            Json::Array(items) => Value::ArrayValue(ArrayValue {
                values: Some(items.into_iter().map(Value::from_json).collect()),
            }),
            Json::Object(map) => Value::MapValue(MapValue {
                fields: Some(map.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect()),
            }),
        }
    }

    /// Convert a Firestore value into plain JSON.
    ///
    /// Timestamps come back as RFC 3339 strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::NullValue(()) => Json::Null,
            Value::BooleanValue(b) => Json::Bool(*b),
            Value::IntegerValue(s) => s
                .parse::<i64>()
                .map(Json::from)
                .unwrap_or_else(|_| Json::String(s.clone())),
            Value::DoubleValue(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::TimestampValue(s) | Value::StringValue(s) => Json::String(s.clone()),
            Value::ArrayValue(a) => Json::Array(
                a.values
                    .as_ref()
                    .map(|vs| vs.iter().map(Value::to_json).collect())
                    .unwrap_or_default(),
            ),
            Value::MapValue(m) => Json::Object(
                m.fields
                    .as_ref()
                    .map(|fs| fs.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
                    .unwrap_or_default(),
            ),
        }
    }

    /// Fields of a map value.
    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::MapValue(m) => m.fields.as_ref(),
            _ => None,
        }
    }
}

// ============================================================================
// Documents
// ============================================================================

/// Firestore document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Create a new document with the given fields.
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            fields: Some(fields),
            ..Default::default()
        }
    }

    /// Create a named document, as required inside a commit.
    pub fn named(name: impl Into<String>, fields: HashMap<String, Value>) -> Self {
        Self {
            name: Some(name.into()),
            fields: Some(fields),
            ..Default::default()
        }
    }

    /// Build a document from a JSON object. Non-object input is rejected.
    pub fn fields_from_json(json: serde_json::Value) -> FirestoreResult<HashMap<String, Value>> {
        match Value::from_json(json) {
            Value::MapValue(m) => Ok(m.fields.unwrap_or_default()),
            _ => Err(FirestoreError::SerializationError(
                "document body must be a JSON object".to_string(),
            )),
        }
    }

    /// Last path segment of the resource name.
    pub fn id(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.rsplit('/').next())
    }

    /// Look up a single field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.as_ref().and_then(|f| f.get(key))
    }

    /// Read a field through `FromFirestoreValue`.
    pub fn get<T: FromFirestoreValue>(&self, key: &str) -> Option<T> {
        self.field(key).and_then(T::from_firestore_value)
    }

    /// All fields as one JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .as_ref()
                .map(|fs| fs.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
                .unwrap_or_default(),
        )
    }
}

// ============================================================================
// Commit Types
// ============================================================================

/// A single write operation in a commit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    /// Update or insert a document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Document>,

    /// Field mask for partial updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,

    /// Transforms applied after the update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_transforms: Option<Vec<FieldTransform>>,

    /// Precondition for the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<Precondition>,
}

impl Write {
    pub fn update(document: Document) -> Self {
        Self {
            update: Some(document),
            ..Default::default()
        }
    }

    pub fn with_mask<I, S>(mut self, field_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update_mask = Some(DocumentMask {
            field_paths: field_paths.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Set `field_path` to the commit time on the server.
    pub fn with_server_timestamp(mut self, field_path: impl Into<String>) -> Self {
        self.update_transforms
            .get_or_insert_with(Vec::new)
            .push(FieldTransform::request_time(field_path));
        self
    }

    pub fn must_exist(mut self, exists: bool) -> Self {
        self.current_document = Some(Precondition {
            exists: Some(exists),
            update_time: None,
        });
        self
    }
}

/// Document field mask for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    pub field_paths: Vec<String>,
}

/// Server-side transform of one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    pub field_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_to_server_value: Option<String>,
}

impl FieldTransform {
    pub fn request_time(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            set_to_server_value: Some("REQUEST_TIME".to_string()),
        }
    }
}

/// Precondition for a write operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Precondition {
    /// Document must (or must not) exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,

    /// Document must have this update time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// Atomic commit request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub writes: Vec<Write>,
}

/// Result of a single write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    pub update_time: Option<String>,
    pub transform_results: Option<Vec<Value>>,
}

/// Commit response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// Results for each write, in order.
    pub write_results: Option<Vec<WriteResult>>,
    pub commit_time: Option<String>,
}

impl CommitResponse {
    /// Commit time as a UTC timestamp.
    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.commit_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ============================================================================
// Query Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_descendants: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub field: FieldReference,
    pub direction: String,
}

/// Subset of the Firestore structured query used by this workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<Order>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

impl StructuredQuery {
    pub fn collection(collection_id: impl Into<String>) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: collection_id.into(),
                all_descendants: None,
            }],
            order_by: None,
            limit: None,
        }
    }

    pub fn order_by_desc(mut self, field_path: impl Into<String>) -> Self {
        self.order_by.get_or_insert_with(Vec::new).push(Order {
            field: FieldReference {
                field_path: field_path.into(),
            },
            direction: "DESCENDING".to_string(),
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit.min(i32::MAX as usize) as i32);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

/// One element of the streamed `runQuery` response array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    pub document: Option<Document>,
    pub read_time: Option<String>,
}

// ============================================================================
// Conversion Traits
// ============================================================================

/// Convert a Rust value to Firestore Value.
pub trait ToFirestoreValue {
    fn to_firestore_value(&self) -> Value;
}

impl ToFirestoreValue for String {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.clone())
    }
}

impl ToFirestoreValue for &str {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.to_string())
    }
}

impl ToFirestoreValue for u32 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToFirestoreValue for f64 {
    fn to_firestore_value(&self) -> Value {
        Value::DoubleValue(*self)
    }
}

impl<T: ToFirestoreValue> ToFirestoreValue for Option<T> {
    fn to_firestore_value(&self) -> Value {
        match self {
            Some(v) => v.to_firestore_value(),
            None => Value::NullValue(()),
        }
    }
}

/// Convert Firestore Value to Rust type.
pub trait FromFirestoreValue: Sized {
    fn from_firestore_value(value: &Value) -> Option<Self>;
}

impl FromFirestoreValue for String {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromFirestoreValue for f64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::DoubleValue(f) => Some(*f),
            Value::IntegerValue(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromFirestoreValue for DateTime<Utc> {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::TimestampValue(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.into()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_wire_format() {
        let v = Value::IntegerValue("24".to_string());
        assert_eq!(serde_json::to_value(&v).unwrap(), json!({"integerValue": "24"}));

        let null = Value::NullValue(());
        assert_eq!(serde_json::to_value(&null).unwrap(), json!({"nullValue": null}));
    }

    #[test]
    fn test_from_json_number_kinds() {
        assert_eq!(Value::from_json(json!(3)), Value::IntegerValue("3".to_string()));
        assert_eq!(Value::from_json(json!(4.25)), Value::DoubleValue(4.25));
    }

    #[test]
    fn test_f64_reads_both_number_kinds() {
        assert_eq!(f64::from_firestore_value(&Value::DoubleValue(0.5)), Some(0.5));
        assert_eq!(f64::from_firestore_value(&Value::IntegerValue("12".to_string())), Some(12.0));
        assert_eq!(f64::from_firestore_value(&Value::StringValue("12".to_string())), None);
    }

    #[test]
    fn test_json_conversion_preserves_nested_structure() {
        let input = json!({
            "camera_id": "cam-1",
            "numerical_data": [0, 1, 2],
            "cloud_vision_data": {"error": false, "congestion_level": 1.5},
            "processing_error": null
        });
        let fields = Document::fields_from_json(input.clone()).unwrap();
        let doc = Document::new(fields);
        assert_eq!(doc.to_json(), input);
    }

    #[test]
    fn test_fields_from_json_rejects_non_object() {
        assert!(Document::fields_from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_write_serialization() {
        let write = Write::update(Document::named("projects/p/databases/d/documents/c/1", HashMap::new()))
            .with_mask(["current_score"])
            .with_server_timestamp("last_analysis_time")
            .must_exist(true);
        let json = serde_json::to_value(&write).unwrap();

        assert_eq!(json["updateMask"]["fieldPaths"], json!(["current_score"]));
        assert_eq!(json["currentDocument"]["exists"], json!(true));
        assert_eq!(
            json["updateTransforms"][0],
            json!({"fieldPath": "last_analysis_time", "setToServerValue": "REQUEST_TIME"})
        );
    }

    #[test]
    fn test_structured_query_serialization() {
        let q = StructuredQuery::collection("analyses").order_by_desc("timestamp").limit(10);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["from"][0]["collectionId"], "analyses");
        assert_eq!(json["orderBy"][0]["direction"], "DESCENDING");
        assert_eq!(json["limit"], 10);
    }

    #[test]
    fn test_commit_time_parses() {
        let resp = CommitResponse {
            write_results: None,
            commit_time: Some("2024-05-01T12:00:00.123456Z".to_string()),
        };
        assert!(resp.committed_at().is_some());
    }

    #[test]
    fn test_document_id_from_name() {
        let doc = Document::named("projects/p/databases/(default)/documents/analyses/abc", HashMap::new());
        assert_eq!(doc.id(), Some("abc"));
    }
}

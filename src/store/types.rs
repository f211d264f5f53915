use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// The tagged value carried by a data item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataValue {
    Text(String),
    Real(f64),
    Flag(bool),
    Object(NestedObject),
    Bytes(Vec<u8>),
}

/// Structured payload variant of [`DataValue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedObject {
    pub name: String,
    pub tags: Vec<String>,
    pub properties: HashMap<String, String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

/// One record of the partitioned store.
///
/// `key` always lies inside the owning node's interval and `source_node` is
/// the id of the node that created the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    pub key: u32,
    pub value: DataValue,
    pub source_node: String,
    pub created_at_ms: u64,
    pub data_type: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl DataItem {
    /// A plain string item, the shape produced by seeding and by `write`
    /// queries.
    pub fn text(key: u32, content: impl Into<String>, source_node: impl Into<String>) -> Self {
        Self {
            key,
            value: DataValue::Text(content.into()),
            source_node: source_node.into(),
            created_at_ms: now_ms(),
            data_type: "string".to_string(),
            metadata: HashMap::new(),
        }
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

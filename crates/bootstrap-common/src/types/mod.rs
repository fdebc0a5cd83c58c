//! Storage record model
//!
//! These types serialize to the JSON shape the storage service accepts on
//! `PUT /records`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder shown for records whose id the storage service assigns
pub const UNASSIGNED_ID: &str = "<unassigned>";

/// Access-control list attached to every record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    pub viewers: Vec<String>,
    pub owners: Vec<String>,
}

impl Acl {
    pub fn new(owners: Vec<String>, viewers: Vec<String>) -> Self {
        Self { viewers, owners }
    }
}

/// Legal metadata attached to every record
///
/// The storage service rejects a `status` field on ingestion, so none is
/// carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Legal {
    pub legaltags: Vec<String>,
    pub other_relevant_data_countries: Vec<String>,
}

impl Legal {
    pub fn new(legaltags: Vec<String>, countries: Vec<String>) -> Self {
        Self {
            legaltags,
            other_relevant_data_countries: countries,
        }
    }
}

/// Parent records this record was derived from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAncestry {
    #[serde(default)]
    pub parents: Vec<String>,
}

/// A domain record ready for submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Assigned by the storage service when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub kind: String,

    pub acl: Acl,

    pub legal: Legal,

    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    #[serde(default)]
    pub ancestry: RecordAncestry,
}

impl Record {
    /// Create a record with no id, meta, or parents
    pub fn new(kind: impl Into<String>, data: Value, acl: Acl, legal: Legal) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            acl,
            legal,
            data,
            meta: None,
            ancestry: RecordAncestry::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Id as it should appear in reports
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or(UNASSIGNED_ID)
    }
}

//! Storage API request and response types
//!
//! Matches the storage service's JSON field names.

use serde::{Deserialize, Serialize};

/// Response body of `PUT /records`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUpdateRecordsResponse {
    pub record_count: usize,
    pub record_ids: Vec<String>,
    pub skipped_record_ids: Vec<String>,
    pub record_id_versions: Vec<String>,
}

/// OAuth2 token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_update_response() {
        let body = r#"{
            "recordCount": 2,
            "recordIds": ["t1:master-data--Well:1", "t1:master-data--Well:2"],
            "skippedRecordIds": [],
            "recordIdVersions": ["t1:master-data--Well:1:1700000000000"]
        }"#;
        let response: CreateUpdateRecordsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.record_count, 2);
        assert_eq!(response.record_ids.len(), 2);
        assert_eq!(response.record_id_versions.len(), 1);
    }

    #[test]
    fn test_parse_partial_response() {
        let response: CreateUpdateRecordsResponse =
            serde_json::from_str(r#"{"recordCount": 1}"#).unwrap();
        assert_eq!(response.record_count, 1);
        assert!(response.skipped_record_ids.is_empty());
    }
}

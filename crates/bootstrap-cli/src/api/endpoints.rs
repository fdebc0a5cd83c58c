//! Storage API endpoint URL builders

/// Build create/update records URL
pub fn records_url(base_url: &str, skip_dupes: bool) -> String {
    format!("{}/records?skipdupes={}", base_url, skip_dupes)
}

/// Build delete record URL
///
/// Record ids go into the path as-is; their colons are valid path characters.
pub fn delete_record_url(base_url: &str, id: &str) -> String {
    format!("{}/records/{}:delete", base_url, id)
}

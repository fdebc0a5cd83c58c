//! Manifest-to-record transformation
//!
//! A manifest is rewritten as text first: every quoted compound identifier
//! (`"<partition>:<type>--<name>:<rest>"`) gets the active partition id in
//! place of its first segment. The rewritten text is then parsed and each raw
//! entry of `ReferenceData` followed by `MasterData` becomes a [`Record`]
//! carrying the run's ACL and legal metadata.

use bootstrap_common::types::{Acl, Legal, Record, RecordAncestry};
use bootstrap_common::{BootstrapError, Result};
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::config::BootstrapConfig;

static RECORD_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([\w\-.{}]+)(:[\w\-.]+--[\w\-.]+:[\w\-.:%]+)""#)
        .unwrap_or_else(|e| unreachable!("record id pattern is valid: {e}"))
});

static RECORD_KIND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([\w\-.]+)(:[\w\-.]+:[\w\-.]+:[0-9]+.[0-9]+.[0-9]+)""#)
        .unwrap_or_else(|e| unreachable!("record kind pattern is valid: {e}"))
});

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(rename = "ReferenceData", default)]
    reference_data: Vec<Value>,
    #[serde(rename = "MasterData", default)]
    master_data: Vec<Value>,
}

/// Builds storage records from manifest text for one partition
#[derive(Debug, Clone)]
pub struct RecordsPreparer {
    data_partition_id: String,
    acl: Acl,
    legal: Legal,
    rewrite_kind_authority: bool,
}

impl RecordsPreparer {
    pub fn new(data_partition_id: impl Into<String>, acl: Acl, legal: Legal) -> Self {
        Self {
            data_partition_id: data_partition_id.into(),
            acl,
            legal,
            rewrite_kind_authority: false,
        }
    }

    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self::new(
            config.storage.data_partition_id.clone(),
            Acl::new(config.acl_owners.clone(), config.acl_viewers.clone()),
            Legal::new(config.legaltags.clone(), config.country_codes.clone()),
        )
        .with_kind_rewrite(config.rewrite_kind_authority)
    }

    /// Also replace the authority segment of `"<authority>:<source>:<entity>:<x.y.z>"` kinds
    pub fn with_kind_rewrite(mut self, enabled: bool) -> Self {
        self.rewrite_kind_authority = enabled;
        self
    }

    /// Substitute the partition segment of every embedded identifier
    pub fn replace_data_partition_id<'a>(&self, content: &'a str) -> Cow<'a, str> {
        let swap = |caps: &Captures<'_>| format!("\"{}{}\"", self.data_partition_id, &caps[2]);

        let rewritten = RECORD_ID_RE.replace_all(content, swap);
        if !self.rewrite_kind_authority {
            return rewritten;
        }

        match rewritten {
            Cow::Borrowed(text) => RECORD_KIND_RE.replace_all(text, swap),
            Cow::Owned(text) => Cow::Owned(RECORD_KIND_RE.replace_all(&text, swap).into_owned()),
        }
    }

    /// Rewrite and parse one manifest, yielding its records lazily
    ///
    /// `path` only labels errors.
    pub fn manifest_records(&self, path: &Path, content: &str) -> Result<ManifestRecords> {
        let rewritten = self.replace_data_partition_id(content);
        let manifest: RawManifest = serde_json::from_str(&rewritten)
            .map_err(|e| BootstrapError::malformed_manifest(path, e))?;

        let mut raw = manifest.reference_data;
        raw.extend(manifest.master_data);

        Ok(ManifestRecords {
            preparer: self.clone(),
            path: path.to_path_buf(),
            raw: raw.into_iter().enumerate(),
        })
    }

    fn prepare_record(&self, path: &Path, index: usize, raw: Value) -> Result<Record> {
        let Value::Object(mut fields) = raw else {
            return Err(BootstrapError::malformed_manifest(
                path,
                format!("record #{index} is not a JSON object"),
            ));
        };

        let kind = match fields.remove("kind") {
            Some(Value::String(kind)) => kind,
            _ => return Err(missing(path, index, "kind")),
        };
        let data = fields
            .remove("data")
            .ok_or_else(|| missing(path, index, "data"))?;

        Ok(Record {
            id: take_string(&mut fields, "id"),
            kind,
            acl: self.acl.clone(),
            legal: self.legal.clone(),
            data,
            meta: fields.remove("meta").filter(|meta| !meta.is_null()),
            ancestry: RecordAncestry {
                parents: ancestry_parents(fields.remove("ancestry")),
            },
        })
    }
}

fn missing(path: &Path, index: usize, field: &'static str) -> BootstrapError {
    BootstrapError::MissingField {
        path: path.to_path_buf(),
        index,
        field,
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn ancestry_parents(ancestry: Option<Value>) -> Vec<String> {
    let Some(Value::Object(mut ancestry)) = ancestry else {
        return Vec::new();
    };
    match ancestry.remove("parents") {
        Some(Value::Array(parents)) => parents
            .into_iter()
            .filter_map(|p| match p {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Single-pass iterator over the records of one parsed manifest
#[derive(Debug)]
pub struct ManifestRecords {
    preparer: RecordsPreparer,
    path: PathBuf,
    raw: std::iter::Enumerate<std::vec::IntoIter<Value>>,
}

impl Iterator for ManifestRecords {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, raw) = self.raw.next()?;
        Some(self.preparer.prepare_record(&self.path, index, raw))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

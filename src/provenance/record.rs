use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{WriteOutcome, canonical_json, file_sha256, sha256_hex, write_deterministic};
use crate::error::{ReelError, Result};

pub const PROVENANCE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDigest {
    pub label: String,
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub tool: String,
    pub tool_version: String,
    pub plan_version: String,
    pub os: String,
    pub arch: String,
}

impl RuntimeInfo {
    pub fn current() -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            plan_version: crate::model::PLAN_VERSION.to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Audit record for one stage run.
///
/// `signature` covers everything except `generated_at` and the input paths,
/// so two runs over the same inputs and flags sign identically regardless of
/// when they happened or how the production root was spelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub schema_version: u32,
    pub stage: String,
    pub inputs: Vec<InputDigest>,
    pub flags: BTreeMap<String, Value>,
    pub runtime: RuntimeInfo,
    pub signature: String,
    pub generated_at: String,
}

#[derive(Serialize)]
struct SignedInput<'a> {
    label: &'a str,
    sha256: &'a str,
}

#[derive(Serialize)]
struct SignedFields<'a> {
    schema_version: u32,
    stage: &'a str,
    inputs: Vec<SignedInput<'a>>,
    flags: &'a BTreeMap<String, Value>,
    runtime: &'a RuntimeInfo,
}

pub fn build_provenance(
    stage: &str,
    inputs: &[(&str, &Path)],
    flags: BTreeMap<String, Value>,
    runtime: RuntimeInfo,
) -> Result<ProvenanceRecord> {
    let mut digests = Vec::with_capacity(inputs.len());
    for (label, path) in inputs {
        if !path.is_file() {
            return Err(ReelError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        digests.push(InputDigest {
            label: (*label).to_string(),
            path: path.display().to_string(),
            sha256: file_sha256(path)?,
        });
    }
    digests.sort_by(|a, b| a.label.cmp(&b.label));

    let signed = SignedFields {
        schema_version: PROVENANCE_SCHEMA_VERSION,
        stage,
        inputs: digests
            .iter()
            .map(|d| SignedInput {
                label: &d.label,
                sha256: &d.sha256,
            })
            .collect(),
        flags: &flags,
        runtime: &runtime,
    };
    let signature = sha256_hex(&canonical_json(&signed)?);

    Ok(ProvenanceRecord {
        schema_version: PROVENANCE_SCHEMA_VERSION,
        stage: stage.to_string(),
        inputs: digests,
        flags,
        runtime,
        signature,
        generated_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// Persist a record; an existing record with the same signature is kept as-is.
pub fn write_provenance(
    path: &Path,
    record: &ProvenanceRecord,
    force: bool,
) -> Result<WriteOutcome> {
    if path.is_file() {
        let existing: Option<ProvenanceRecord> = serde_json::from_slice(&fs::read(path)?).ok();
        if existing.is_some_and(|existing| existing.signature == record.signature) {
            return Ok(WriteOutcome::Unchanged);
        }
    }
    write_deterministic(path, record, force)
}

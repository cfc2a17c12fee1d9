use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::read_json_value;
use crate::error::{ReelError, Result};

pub const MAX_CLAIM_WORDS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    Basic,
    Strict,
}

impl AuditLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditLevel::Basic => "basic",
            AuditLevel::Strict => "strict",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "basic" => Some(AuditLevel::Basic),
            "strict" => Some(AuditLevel::Strict),
            _ => None,
        }
    }
}

/// The assertion a reel is built around. Read once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    pub claim_id: String,
    /// Spoken verbatim as the opening line.
    pub claim_text: String,
    pub supporting_data_ref: String,
    pub audit_level: AuditLevel,
    pub tags: Vec<String>,
    pub risk_notes: Vec<String>,
    pub thumbnail_text: Option<String>,
}

impl Claim {
    pub fn from_value(value: &Value, context: &str) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| ReelError::schema(context, "claim must be a JSON object"))?;

        let required = |field: &str| -> Result<String> {
            match obj.get(field) {
                Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
                Some(Value::String(_)) => {
                    Err(ReelError::schema(context, format!("'{field}' must not be empty")))
                }
                Some(_) => Err(ReelError::schema(context, format!("'{field}' must be a string"))),
                None => Err(ReelError::schema(
                    context,
                    format!("missing required field '{field}'"),
                )),
            }
        };

        let claim_id = required("claim_id")?;
        let claim_text = required("claim_text")?;
        let supporting_data_ref = required("supporting_data_ref")?;
        let audit_raw = required("audit_level")?;
        let audit_level = AuditLevel::parse(&audit_raw).ok_or_else(|| {
            ReelError::schema(
                context,
                format!("audit_level must be 'basic' or 'strict', got '{audit_raw}'"),
            )
        })?;

        let word_count = claim_text.split_whitespace().count();
        if word_count > MAX_CLAIM_WORDS {
            return Err(ReelError::schema(
                context,
                format!("claim_text has {word_count} words (limit {MAX_CLAIM_WORDS})"),
            ));
        }

        let tags = string_list(obj.get("tags"), "tags", context)?;
        let risk_notes = string_list(obj.get("risk_notes"), "risk_notes", context)?;
        let thumbnail_text = match obj.get("thumbnail_text") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(_) => {
                return Err(ReelError::schema(context, "'thumbnail_text' must be a string"));
            }
        };

        Ok(Self {
            claim_id,
            claim_text,
            supporting_data_ref,
            audit_level,
            tags,
            risk_notes,
            thumbnail_text,
        })
    }
}

/// Accepts either a single string or an array of strings.
fn string_list(value: Option<&Value>, field: &str, context: &str) -> Result<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ReelError::schema(context, format!("'{field}' entries must be strings"))
                })
            })
            .collect(),
        Some(_) => Err(ReelError::schema(
            context,
            format!("'{field}' must be a string or a list of strings"),
        )),
    }
}

pub fn load_claim(path: &Path) -> Result<Claim> {
    let value = read_json_value(path)?;
    Claim::from_value(&value, &path.display().to_string())
}

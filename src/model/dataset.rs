use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};

use super::read_json_value;
use crate::error::{ReelError, Result};

/// A chart render request as declared in `data.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartJobInput {
    pub chart_id: String,
    /// Explicit placement; unset charts are distributed by the planner.
    pub subsegment_id: Option<String>,
    pub props: Value,
}

/// Free-form supporting data. Only the optional `charts` array is interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub charts: Vec<ChartJobInput>,
}

impl Dataset {
    pub fn from_value(raw: Value, context: &str) -> Result<Self> {
        let charts = match raw.get("charts") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => parse_charts(entries, context)?,
            Some(_) => return Err(ReelError::schema(context, "'charts' must be an array")),
        };
        Ok(Self { charts })
    }
}

fn parse_charts(entries: &[Value], context: &str) -> Result<Vec<ChartJobInput>> {
    let mut seen = BTreeSet::new();
    let mut charts = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let obj = entry
            .as_object()
            .ok_or_else(|| ReelError::schema(context, format!("charts[{idx}] must be an object")))?;
        let chart_id = match obj.get("chart_id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
            _ => {
                return Err(ReelError::schema(
                    context,
                    format!("charts[{idx}] needs a non-empty 'chart_id'"),
                ));
            }
        };
        if !seen.insert(chart_id.clone()) {
            return Err(ReelError::schema(
                context,
                format!("duplicate chart_id '{chart_id}'"),
            ));
        }
        let subsegment_id = match obj.get("subsegment_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) if !id.trim().is_empty() => Some(id.trim().to_string()),
            Some(_) => {
                return Err(ReelError::schema(
                    context,
                    format!("charts[{idx}].subsegment_id must be a non-empty string"),
                ));
            }
        };
        let props = match obj.get("props") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(Value::Object(props)) => Value::Object(props.clone()),
            Some(_) => {
                return Err(ReelError::schema(
                    context,
                    format!("charts[{idx}].props must be an object"),
                ));
            }
        };
        charts.push(ChartJobInput {
            chart_id,
            subsegment_id,
            props,
        });
    }
    Ok(charts)
}

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let value = read_json_value(path)?;
    Dataset::from_value(value, &path.display().to_string())
}

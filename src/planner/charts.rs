use crate::error::{ReelError, Result};
use crate::model::ChartJobInput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartAssignment {
    pub chart_id: String,
    pub subsegment_id: String,
}

/// Map each chart job to a subsegment, preserving input order.
///
/// Explicit `subsegment_id` references win. The rest rotate through every
/// subsegment after the first, which is reserved for the hook.
pub fn assign_charts(
    charts: &[ChartJobInput],
    subsegment_ids: &[String],
) -> Result<Vec<ChartAssignment>> {
    let rotation = subsegment_ids.get(1..).unwrap_or_default();
    let mut next = 0usize;
    let mut assignments = Vec::with_capacity(charts.len());

    for chart in charts {
        let target = match &chart.subsegment_id {
            Some(explicit) => {
                if !subsegment_ids.iter().any(|id| id == explicit) {
                    return Err(ReelError::schema(
                        "data.json",
                        format!(
                            "chart '{}' references unknown subsegment '{explicit}'",
                            chart.chart_id
                        ),
                    ));
                }
                explicit.clone()
            }
            None => {
                if rotation.is_empty() {
                    return Err(ReelError::schema(
                        "data.json",
                        format!("no subsegment available for chart '{}'", chart.chart_id),
                    ));
                }
                let id = rotation[next % rotation.len()].clone();
                next += 1;
                id
            }
        };
        assignments.push(ChartAssignment {
            chart_id: chart.chart_id.clone(),
            subsegment_id: target,
        });
    }
    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids() -> Vec<String> {
        ["s01", "s02", "s03", "s04", "s05"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn chart(id: &str, target: Option<&str>) -> ChartJobInput {
        ChartJobInput {
            chart_id: id.to_string(),
            subsegment_id: target.map(str::to_string),
            props: json!({}),
        }
    }

    fn targets(assignments: &[ChartAssignment]) -> Vec<&str> {
        assignments.iter().map(|a| a.subsegment_id.as_str()).collect()
    }

    #[test]
    fn three_unplaced_charts_skip_the_hook() {
        let charts = [chart("a", None), chart("b", None), chart("c", None)];
        let assigned = assign_charts(&charts, &ids()).unwrap();
        assert_eq!(targets(&assigned), vec!["s02", "s03", "s04"]);
    }

    #[test]
    fn rotation_wraps_and_ignores_explicit_placements() {
        let charts = [
            chart("a", None),
            chart("pinned", Some("s01")),
            chart("b", None),
            chart("c", None),
            chart("d", None),
            chart("e", None),
        ];
        let assigned = assign_charts(&charts, &ids()).unwrap();
        assert_eq!(
            targets(&assigned),
            vec!["s02", "s01", "s03", "s04", "s05", "s02"]
        );
    }

    #[test]
    fn unknown_explicit_target_is_a_schema_error() {
        let err = assign_charts(&[chart("a", Some("s09"))], &ids()).unwrap_err();
        assert!(matches!(err, ReelError::Schema { .. }));
    }
}

use crate::area::AreaId;
use crate::error::StageError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Polygon,
    Extract,
    Snapshot,
    Filter,
    Load,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PeriodOutcome {
    Loaded,
    Failed { stage: Stage, error: String },
}

impl PeriodOutcome {
    pub fn failed(stage: Stage, err: &StageError) -> Self {
        PeriodOutcome::Failed {
            stage,
            error: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
    pub period: String,
    pub outcome: PeriodOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AreaOutcome {
    Skipped { stage: Stage, error: String },
    Processed { periods: Vec<PeriodReport> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaReport {
    pub area: AreaId,
    pub outcome: AreaOutcome,
}

impl AreaReport {
    pub fn skipped(area: AreaId, stage: Stage, err: &StageError) -> Self {
        AreaReport {
            area,
            outcome: AreaOutcome::Skipped {
                stage,
                error: err.to_string(),
            },
        }
    }

    pub fn loaded(&self) -> usize {
        match &self.outcome {
            AreaOutcome::Skipped { .. } => 0,
            AreaOutcome::Processed { periods } => periods
                .iter()
                .filter(|p| p.outcome == PeriodOutcome::Loaded)
                .count(),
        }
    }

    pub fn failures(&self) -> usize {
        match &self.outcome {
            AreaOutcome::Skipped { .. } => 1,
            AreaOutcome::Processed { periods } => periods
                .iter()
                .filter(|p| p.outcome != PeriodOutcome::Loaded)
                .count(),
        }
    }
}

/// Outcome of every area and period a run touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub areas: Vec<AreaReport>,
    pub aborted: bool,
}

impl RunReport {
    pub fn loaded(&self) -> usize {
        self.areas.iter().map(AreaReport::loaded).sum()
    }

    pub fn failures(&self) -> usize {
        self.areas.iter().map(AreaReport::failures).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0 && !self.aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_outcomes() {
        let report = RunReport {
            areas: vec![
                AreaReport::skipped(
                    AreaId(1),
                    Stage::Polygon,
                    &StageError::PolygonStatus {
                        area: AreaId(1),
                        status: 500,
                    },
                ),
                AreaReport {
                    area: AreaId(2),
                    outcome: AreaOutcome::Processed {
                        periods: vec![
                            PeriodReport {
                                period: "2010_01".into(),
                                outcome: PeriodOutcome::Loaded,
                            },
                            PeriodReport {
                                period: "2010_04".into(),
                                outcome: PeriodOutcome::Failed {
                                    stage: Stage::Filter,
                                    error: "osmium exited with status 1: ".into(),
                                },
                            },
                        ],
                    },
                },
            ],
            aborted: false,
        };
        assert_eq!(report.loaded(), 1);
        assert_eq!(report.failures(), 2);
        assert!(!report.is_success());

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value["areas"][0],
            json!({
                "area": 1,
                "outcome": {
                    "status": "skipped",
                    "stage": "polygon",
                    "error": "polygon service returned status 500 for area 1"
                }
            })
        );
        assert_eq!(
            value["areas"][1]["outcome"]["periods"][1]["outcome"],
            json!({"status": "failed", "stage": "filter", "error": "osmium exited with status 1: "})
        );
    }

    #[test]
    fn empty_report_is_success() {
        assert!(RunReport::default().is_success());
    }
}

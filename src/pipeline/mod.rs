//! Per-area, per-period driver for the extraction pipeline.
//!
//! For every area the polygon is resolved and the history extracted once;
//! then each period is snapshotted, filtered for buildings and loaded. A
//! failing stage ends its unit of work (the area, or the single period) and
//! the driver moves on.

use super::area::AreaId;
use super::config::PipelineConfig;
use super::error::StageError;
use super::layout::{table_prefix, Layout};
use super::period::{Period, Periods};
use super::resolver::{resolve_polygon, PolygonService};
use super::tools::{self, DatabaseConfig, Tools};
use serde::Serialize;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{error, info, instrument};

pub mod report;

pub use report::{AreaOutcome, AreaReport, PeriodOutcome, PeriodReport, RunReport, Stage};

/// One method per pipeline stage. Every derived value is passed in.
#[allow(async_fn_in_trait)]
pub trait Stages {
    async fn resolve_polygon(&self, area: AreaId) -> Result<PathBuf, StageError>;

    async fn extract_history(&self, area: AreaId, polygon: &Path) -> Result<PathBuf, StageError>;

    async fn snapshot(
        &self,
        area: AreaId,
        history: &Path,
        period: &Period,
    ) -> Result<PathBuf, StageError>;

    async fn filter_buildings(
        &self,
        area: AreaId,
        snapshot: &Path,
        period: &Period,
    ) -> Result<PathBuf, StageError>;

    async fn load(&self, area: AreaId, buildings: &Path, period: &Period)
        -> Result<(), StageError>;
}

/// Stages backed by the polygon service, osmium and osm2pgsql.
#[derive(Debug, Clone)]
pub struct OsmStages {
    service: PolygonService,
    layout: Layout,
    history: PathBuf,
    tools: Tools,
    database: DatabaseConfig,
    geojson: bool,
}

impl OsmStages {
    pub fn new(config: &PipelineConfig) -> Result<Self, reqwest::Error> {
        let service = PolygonService::new(&config.polygon_url, config.http_timeout)?;
        Ok(OsmStages {
            service,
            layout: config.layout.clone(),
            history: config.history.clone(),
            tools: config.tools.clone(),
            database: config.database.clone(),
            geojson: config.geojson,
        })
    }
}

impl Stages for OsmStages {
    async fn resolve_polygon(&self, area: AreaId) -> Result<PathBuf, StageError> {
        resolve_polygon(&self.service, &self.layout, area, self.geojson).await
    }

    #[instrument(skip(self))]
    async fn extract_history(&self, area: AreaId, polygon: &Path) -> Result<PathBuf, StageError> {
        let out = self.layout.history(area);
        tools::run(&tools::extract_history(&self.tools, polygon, &self.history, &out)).await?;
        Ok(out)
    }

    #[instrument(skip(self, period), fields(period = %period))]
    async fn snapshot(
        &self,
        area: AreaId,
        history: &Path,
        period: &Period,
    ) -> Result<PathBuf, StageError> {
        let out = self.layout.snapshot(area, period);
        tools::run(&tools::time_filter(&self.tools, history, period, &out)).await?;
        Ok(out)
    }

    #[instrument(skip(self, period), fields(period = %period))]
    async fn filter_buildings(
        &self,
        area: AreaId,
        snapshot: &Path,
        period: &Period,
    ) -> Result<PathBuf, StageError> {
        let out = self.layout.buildings(area, period);
        tools::run(&tools::tags_filter(&self.tools, snapshot, &out)).await?;
        Ok(out)
    }

    #[instrument(skip(self, period), fields(period = %period))]
    async fn load(
        &self,
        area: AreaId,
        buildings: &Path,
        period: &Period,
    ) -> Result<(), StageError> {
        let prefix = table_prefix(area, period);
        tools::run(&tools::import(&self.tools, &self.database, buildings, &prefix)).await
    }
}

/// What the driver does after a failed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Skip the failed area or period and carry on.
    Continue,
    /// Stop the run after the first failure.
    FailFast,
}

pub struct Pipeline<S> {
    config: PipelineConfig,
    stages: S,
}

impl<S: Stages> Pipeline<S> {
    pub fn new(config: PipelineConfig, stages: S) -> Self {
        Pipeline { config, stages }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn periods(&self, until: OffsetDateTime) -> Periods {
        Periods::new(self.config.start, until, self.config.step_months)
    }

    /// Runs every configured area up to (excluding) `until`.
    pub async fn run(&self, until: OffsetDateTime) -> RunReport {
        let mut report = RunReport::default();
        for area in &self.config.areas {
            let area_report = self.run_area(*area, until).await;
            let failed = area_report.failures() > 0;
            report.areas.push(area_report);
            if failed && self.config.failure_policy == FailurePolicy::FailFast {
                error!(%area, "stopping after failure");
                report.aborted = true;
                break;
            }
        }
        info!(
            areas = report.areas.len(),
            loaded = report.loaded(),
            failures = report.failures(),
            "run finished"
        );
        report
    }

    #[instrument(skip(self, until))]
    pub async fn run_area(&self, area: AreaId, until: OffsetDateTime) -> AreaReport {
        let history = match self.prepare_area(area).await {
            Ok(history) => history,
            Err((stage, err)) => {
                error!(%area, ?stage, error = %err, "skipping area");
                return AreaReport::skipped(area, stage, &err);
            }
        };

        let mut periods = vec![];
        for period in self.periods(until) {
            let outcome = match self.run_period(area, &history, &period).await {
                Ok(()) => {
                    info!(%area, %period, "period loaded");
                    PeriodOutcome::Loaded
                }
                Err((stage, err)) => {
                    error!(%area, %period, ?stage, error = %err, "skipping period");
                    PeriodOutcome::failed(stage, &err)
                }
            };
            let failed = outcome != PeriodOutcome::Loaded;
            periods.push(PeriodReport {
                period: period.label(),
                outcome,
            });
            if failed && self.config.failure_policy == FailurePolicy::FailFast {
                break;
            }
        }
        AreaReport {
            area,
            outcome: AreaOutcome::Processed { periods },
        }
    }

    async fn prepare_area(&self, area: AreaId) -> Result<PathBuf, (Stage, StageError)> {
        let polygon = self
            .stages
            .resolve_polygon(area)
            .await
            .map_err(|err| (Stage::Polygon, err))?;
        info!(%area, polygon = ?polygon, "polygon resolved");
        let history = self
            .stages
            .extract_history(area, &polygon)
            .await
            .map_err(|err| (Stage::Extract, err))?;
        info!(%area, history = ?history, "history extracted");
        Ok(history)
    }

    async fn run_period(
        &self,
        area: AreaId,
        history: &Path,
        period: &Period,
    ) -> Result<(), (Stage, StageError)> {
        let snapshot = self
            .stages
            .snapshot(area, history, period)
            .await
            .map_err(|err| (Stage::Snapshot, err))?;
        let buildings = self
            .stages
            .filter_buildings(area, &snapshot, period)
            .await
            .map_err(|err| (Stage::Filter, err))?;
        self.stages
            .load(area, &buildings, period)
            .await
            .map_err(|err| (Stage::Load, err))
    }
}

use super::area::AreaId;
use super::error::ConfigError;
use super::layout::Layout;
use super::pipeline::FailurePolicy;
use super::resolver::DEFAULT_POLYGON_URL;
use super::tools::{DatabaseConfig, Tools};
use std::fs;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;
use time::macros::datetime;
use time::OffsetDateTime;

pub const DEFAULT_STEP_MONTHS: u32 = 3;

/// Everything the pipeline needs, fixed at construction time.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub areas: Vec<AreaId>,
    pub history: PathBuf,
    pub layout: Layout,
    pub start: OffsetDateTime,
    pub step_months: NonZeroU32,
    pub database: DatabaseConfig,
    pub tools: Tools,
    pub polygon_url: String,
    pub http_timeout: Duration,
    pub geojson: bool,
    pub failure_policy: FailurePolicy,
}

impl PipelineConfig {
    /// A config with defaults for everything but the inputs that have none.
    pub fn new(
        areas: Vec<AreaId>,
        history: PathBuf,
        layout: Layout,
        database: DatabaseConfig,
    ) -> Self {
        PipelineConfig {
            areas,
            history,
            layout,
            start: datetime!(2000-01-01 0:00 UTC),
            step_months: NonZeroU32::new(DEFAULT_STEP_MONTHS).unwrap_or(NonZeroU32::MIN),
            database,
            tools: Tools::default(),
            polygon_url: DEFAULT_POLYGON_URL.into(),
            http_timeout: Duration::from_secs(60),
            geojson: false,
            failure_policy: FailurePolicy::Continue,
        }
    }

    /// Rejects configs that cannot produce a single snapshot before `until`.
    pub fn validate(&self, until: OffsetDateTime) -> Result<(), ConfigError> {
        if self.areas.is_empty() {
            return Err(ConfigError::NoAreas);
        }
        if self.start >= until {
            return Err(ConfigError::EmptyRange {
                start: self.start.to_string(),
                until: until.to_string(),
            });
        }
        if !self.history.exists() {
            return Err(ConfigError::MissingHistory(self.history.clone()));
        }
        Ok(())
    }

    pub fn create_output_dirs(&self) -> Result<(), ConfigError> {
        for dir in [self.layout.poly_dir(), self.layout.pbf_dir()] {
            fs::create_dir_all(dir).map_err(|source| ConfigError::OutputDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

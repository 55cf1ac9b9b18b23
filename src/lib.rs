//! Time-sliced building snapshots from an OSM history archive.
//!
//! For each administrative area the boundary polygon is fetched, the area's
//! history is cut out of a full-history archive with `osmium`, and for every
//! period a snapshot is taken, filtered down to buildings and imported with
//! `osm2pgsql`.

pub mod area;
pub mod config;
pub mod error;
pub mod geojson;
pub mod layout;
pub mod observability;
pub mod period;
pub mod pipeline;
pub mod poly;
pub mod resolver;
pub mod tools;

pub use area::AreaId;
pub use config::PipelineConfig;
pub use error::{ConfigError, StageError};
pub use pipeline::{FailurePolicy, OsmStages, Pipeline, RunReport, Stages};

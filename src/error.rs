use super::area::AreaId;
use super::poly::PolyError;
use std::path::PathBuf;

/// Why a single pipeline stage did not produce its output.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("polygon request for area {area} failed: {source}")]
    Http {
        area: AreaId,
        #[source]
        source: reqwest::Error,
    },

    #[error("polygon service returned status {status} for area {area}")]
    PolygonStatus { area: AreaId, status: u16 },

    #[error("polygon service returned no usable polygon for area {area}: {source}")]
    Polygon {
        area: AreaId,
        #[source]
        source: PolyError,
    },

    #[error("could not launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {stderr}", exit_code(.code))]
    Tool {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("could not write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".into(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no areas configured")]
    NoAreas,

    #[error("start {start} is not before until {until}")]
    EmptyRange { start: String, until: String },

    #[error("history archive {0:?} does not exist")]
    MissingHistory(PathBuf),

    #[error("could not create output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

//! Command lines for the external OSM tools and a runner that turns their
//! exit status into a [`StageError`].

use super::error::StageError;
use super::period::Period;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Program names, so that tools outside `PATH` or wrappers can be used.
#[derive(Debug, Clone)]
pub struct Tools {
    pub osmium: String,
    pub osm2pgsql: String,
}

impl Default for Tools {
    fn default() -> Self {
        Tools {
            osmium: "osmium".into(),
            osm2pgsql: "osm2pgsql".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub name: String,
    pub user: String,
    pub host: String,
    pub port: Option<u16>,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    fn new(program: &str) -> Self {
        Invocation {
            program: program.to_string(),
            args: vec![],
        }
    }

    fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

pub fn extract_history(tools: &Tools, polygon: &Path, history: &Path, out: &Path) -> Invocation {
    Invocation::new(&tools.osmium)
        .arg("extract")
        .arg("--overwrite")
        .arg("-p")
        .arg(polygon)
        .arg("--with-history")
        .arg(history)
        .arg("-o")
        .arg(out)
}

pub fn time_filter(tools: &Tools, history: &Path, period: &Period, out: &Path) -> Invocation {
    Invocation::new(&tools.osmium)
        .arg("time-filter")
        .arg(history)
        .arg(period.timestamp())
        .arg("--overwrite")
        .arg("-o")
        .arg(out)
}

pub fn tags_filter(tools: &Tools, snapshot: &Path, out: &Path) -> Invocation {
    Invocation::new(&tools.osmium)
        .arg("tags-filter")
        .arg(snapshot)
        .arg("building")
        .arg("--overwrite")
        .arg("-o")
        .arg(out)
}

pub fn import(tools: &Tools, db: &DatabaseConfig, buildings: &Path, prefix: &str) -> Invocation {
    let invocation = Invocation::new(&tools.osm2pgsql)
        .arg("-v")
        .arg("-c")
        .arg("-s")
        .arg("-d")
        .arg(&db.name)
        .arg(buildings)
        .arg("-U")
        .arg(&db.user)
        .arg("-H")
        .arg(&db.host);
    let invocation = match db.port {
        Some(port) => invocation.arg("-P").arg(port.to_string()),
        None => invocation,
    };
    invocation
        .arg("-S")
        .arg(&db.style)
        .arg("-p")
        .arg(prefix)
        .arg("--extra-attributes")
}

// Keep error reports readable, osm2pgsql -v is chatty.
const STDERR_TAIL: usize = 2048;

fn tail(output: &[u8]) -> String {
    let text = String::from_utf8_lossy(output);
    let text = text.trim();
    let start = text.len().saturating_sub(STDERR_TAIL);
    let start = (start..text.len())
        .find(|idx| text.is_char_boundary(*idx))
        .unwrap_or(text.len());
    text[start..].to_string()
}

/// Runs an invocation to completion. Success is judged by exit status only.
pub async fn run(invocation: &Invocation) -> Result<(), StageError> {
    info!(command = %invocation, "running");
    let output = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| StageError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

    if output.status.success() {
        debug!(stderr = %tail(&output.stderr), "completed");
        return Ok(());
    }
    let err = StageError::Tool {
        program: invocation.program.clone(),
        code: output.status.code(),
        stderr: tail(&output.stderr),
    };
    warn!(command = %invocation, error = %err, "command failed");
    Err(err)
}

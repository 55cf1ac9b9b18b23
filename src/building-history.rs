use osm_building_history::layout::Layout;
use osm_building_history::observability::{get_subscriber, init_subscriber};
use osm_building_history::tools::{DatabaseConfig, Tools};
use osm_building_history::{AreaId, FailurePolicy, OsmStages, Pipeline, PipelineConfig};
use std::error::Error;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::{error, info};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "building-history",
    about = "load periodic building snapshots of osm areas into postgres"
)]
pub struct Opt {
    /// osm relation ids of the areas
    #[structopt(
        short = "a",
        long = "area",
        env = "AREAS",
        use_delimiter = true,
        required = true
    )]
    pub areas: Vec<AreaId>,
    /// full history pbf
    #[structopt(
        long = "history",
        env = "HISTORY_FILE",
        default_value = "data/history-latest.osm.pbf"
    )]
    pub history: PathBuf,
    /// output directory for .poly files
    #[structopt(long, env = "POLY_DIR", default_value = "data/outputs/citypolys")]
    pub poly_dir: PathBuf,
    /// output directory for .osm.pbf files
    #[structopt(long, env = "PBF_DIR", default_value = "data/outputs/citypbfs")]
    pub pbf_dir: PathBuf,
    /// first snapshot date (YYYY-MM-DD)
    #[structopt(long, env = "START_DATE", default_value = "2000-01-01", parse(try_from_str = parse_date))]
    pub start: OffsetDateTime,
    /// snapshots are taken before this date (YYYY-MM-DD), defaults to now
    #[structopt(long, env = "UNTIL_DATE", parse(try_from_str = parse_date))]
    pub until: Option<OffsetDateTime>,
    /// months between snapshots
    #[structopt(long = "step", env = "STEP_MONTHS", default_value = "3")]
    pub step_months: NonZeroU32,
    /// database name
    #[structopt(long, env = "DB_NAME")]
    pub db_name: String,
    /// database user
    #[structopt(long, env = "DB_USER")]
    pub db_user: String,
    /// database host
    #[structopt(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,
    /// database port
    #[structopt(long, env = "DB_PORT")]
    pub db_port: Option<u16>,
    /// osm2pgsql style file
    #[structopt(long, env = "DB_STYLE", default_value = "dates.style")]
    pub db_style: String,
    /// polygon service base url
    #[structopt(
        long,
        env = "POLYGON_URL",
        default_value = "http://polygons.openstreetmap.fr"
    )]
    pub polygon_url: String,
    /// polygon request timeout in seconds
    #[structopt(long, env = "HTTP_TIMEOUT", default_value = "60")]
    pub http_timeout: u64,
    /// osmium binary
    #[structopt(long, env = "OSMIUM", default_value = "osmium")]
    pub osmium: String,
    /// osm2pgsql binary
    #[structopt(long, env = "OSM2PGSQL", default_value = "osm2pgsql")]
    pub osm2pgsql: String,
    /// also write {area}.geojson next to each .poly
    #[structopt(long)]
    pub geojson: bool,
    /// stop after the first failing stage
    #[structopt(long)]
    pub fail_fast: bool,
    /// write a json run report to this file
    #[structopt(short = "r", long = "report", env = "REPORT_FILE")]
    pub report_path: Option<PathBuf>,
}

fn parse_date(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    let date = Date::parse(s, format_description!("[year]-[month]-[day]"))?;
    Ok(date.midnight().assume_utc())
}

impl Opt {
    fn into_config(self) -> PipelineConfig {
        let database = DatabaseConfig {
            name: self.db_name,
            user: self.db_user,
            host: self.db_host,
            port: self.db_port,
            style: self.db_style,
        };
        let layout = Layout::new(self.poly_dir, self.pbf_dir);
        let mut config = PipelineConfig::new(self.areas, self.history, layout, database);
        config.start = self.start;
        config.step_months = self.step_months;
        config.tools = Tools {
            osmium: self.osmium,
            osm2pgsql: self.osm2pgsql,
        };
        config.polygon_url = self.polygon_url;
        config.http_timeout = Duration::from_secs(self.http_timeout);
        config.geojson = self.geojson;
        config.failure_policy = if self.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::Continue
        };
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut opt = Opt::from_args();
    init_subscriber(get_subscriber("info"))?;

    let until = opt.until.unwrap_or_else(OffsetDateTime::now_utc);
    let report_path = opt.report_path.take();
    let config = opt.into_config();
    config.validate(until)?;
    config.create_output_dirs()?;

    info!(
        areas = ?config.areas,
        start = %config.start,
        %until,
        step_months = config.step_months.get(),
        "starting run"
    );
    let stages = OsmStages::new(&config)?;
    let pipeline = Pipeline::new(config, stages);
    let report = pipeline.run(until).await;

    if let Some(path) = report_path {
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        info!(report = ?path, "report written");
    }
    if !report.is_success() {
        error!(failures = report.failures(), "run finished with failures");
        std::process::exit(1);
    }
    Ok(())
}

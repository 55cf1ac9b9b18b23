use actix_web::{web, App, HttpResponse, HttpServer};
use osm_building_history::layout::Layout;
use osm_building_history::pipeline::{AreaOutcome, PeriodOutcome, Stage};
use osm_building_history::resolver::{resolve_polygon, PolygonService};
use osm_building_history::tools::{DatabaseConfig, Tools};
use osm_building_history::{AreaId, OsmStages, Pipeline, PipelineConfig, StageError};
use serde::Deserialize;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;
use time::macros::datetime;

const POLY: &str = "polygon
1
\t8.7E+00\t5.3E+01
\t8.9E+00\t5.3E+01
\t8.9E+00\t5.31E+01
\t8.7E+00\t5.31E+01
\t8.7E+00\t5.3E+01
END
END
";

const BREMEN: u64 = 2062154;
const NOT_A_POLYGON: u64 = 1;

#[derive(Deserialize)]
struct PolyQuery {
    id: u64,
    params: u8,
}

async fn get_poly(query: web::Query<PolyQuery>) -> HttpResponse {
    assert_eq!(query.params, 0);
    match query.id {
        BREMEN => HttpResponse::Ok().body(POLY),
        NOT_A_POLYGON => HttpResponse::Ok().body("None\n"),
        _ => HttpResponse::NotFound().finish(),
    }
}

fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let server = HttpServer::new(|| App::new().route("/get_poly.py", web::get().to(get_poly)))
        .listen(listener)
        .expect("Failed to listen")
        .workers(1)
        .run();
    let _ = actix_web::rt::spawn(server);
    format!("http://127.0.0.1:{}", port)
}

fn config(base_url: &str, dir: &Path, areas: &[u64]) -> PipelineConfig {
    let history = dir.join("history-latest.osm.pbf");
    std::fs::write(&history, b"").unwrap();
    let layout = Layout::new(dir.join("citypolys"), dir.join("citypbfs"));
    let database = DatabaseConfig {
        name: "history_test".into(),
        user: "osmimport".into(),
        host: "localhost".into(),
        port: None,
        style: "dates.style".into(),
    };
    let areas = areas.iter().copied().map(AreaId).collect();
    let mut config = PipelineConfig::new(areas, history, layout, database);
    config.start = datetime!(2010-01-01 0:00 UTC);
    config.polygon_url = base_url.to_string();
    config.http_timeout = Duration::from_secs(5);
    config.tools = Tools {
        osmium: "true".into(),
        osm2pgsql: "true".into(),
    };
    config
}

#[actix_web::test]
async fn resolves_polygon_to_file() {
    // Arrange
    let base_url = spawn_app();
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path(), dir.path());
    let service = PolygonService::new(&base_url, Duration::from_secs(5)).unwrap();

    // Act
    let path = resolve_polygon(&service, &layout, AreaId(BREMEN), true)
        .await
        .expect("Failed to resolve polygon");

    // Assert
    assert_eq!(path, dir.path().join("2062154.poly"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), POLY);
    assert!(dir.path().join("2062154.geojson").exists());
}

#[actix_web::test]
async fn rejects_missing_and_malformed_polygons() {
    // Arrange
    let base_url = spawn_app();
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path(), dir.path());
    let service = PolygonService::new(&base_url, Duration::from_secs(5)).unwrap();

    // Act
    let missing = resolve_polygon(&service, &layout, AreaId(404), false).await;
    let malformed = resolve_polygon(&service, &layout, AreaId(NOT_A_POLYGON), false).await;

    // Assert
    assert!(matches!(
        missing,
        Err(StageError::PolygonStatus { status: 404, .. })
    ));
    assert!(matches!(malformed, Err(StageError::Polygon { .. })));
    assert!(!dir.path().join("404.poly").exists());
    assert!(!dir.path().join("1.poly").exists());
}

#[actix_web::test]
async fn loads_every_period_and_skips_unresolvable_areas() {
    // Arrange
    let base_url = spawn_app();
    let dir = tempfile::tempdir().unwrap();
    let config = config(&base_url, dir.path(), &[404, BREMEN]);
    config.create_output_dirs().unwrap();
    let stages = OsmStages::new(&config).unwrap();
    let pipeline = Pipeline::new(config, stages);

    // Act
    let report = pipeline.run(datetime!(2010-08-01 0:00 UTC)).await;

    // Assert
    assert!(matches!(
        report.areas[0].outcome,
        AreaOutcome::Skipped {
            stage: Stage::Polygon,
            ..
        }
    ));
    match &report.areas[1].outcome {
        AreaOutcome::Processed { periods } => {
            let labels: Vec<&str> = periods.iter().map(|p| p.period.as_str()).collect();
            assert_eq!(labels, ["2010_01", "2010_04", "2010_07"]);
            assert!(periods.iter().all(|p| p.outcome == PeriodOutcome::Loaded));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(dir.path().join("citypolys/2062154.poly").exists());
    assert_eq!(report.loaded(), 3);
    assert_eq!(report.failures(), 1);
}

#[actix_web::test]
async fn import_failures_are_reported_per_period() {
    // Arrange
    let base_url = spawn_app();
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&base_url, dir.path(), &[BREMEN]);
    config.tools.osm2pgsql = "false".into();
    config.create_output_dirs().unwrap();
    let stages = OsmStages::new(&config).unwrap();
    let pipeline = Pipeline::new(config, stages);

    // Act
    let report = pipeline.run(datetime!(2010-08-01 0:00 UTC)).await;

    // Assert
    match &report.areas[0].outcome {
        AreaOutcome::Processed { periods } => {
            assert_eq!(periods.len(), 3);
            for period in periods {
                match &period.outcome {
                    PeriodOutcome::Failed { stage, error } => {
                        assert_eq!(*stage, Stage::Load);
                        assert!(error.starts_with("false exited with status 1"));
                    }
                    other => panic!("unexpected outcome: {:?}", other),
                }
            }
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(!report.is_success());
}

use super::area::AreaId;
use super::error::StageError;
use super::geojson::write_geojson;
use super::layout::Layout;
use super::poly::{self, Boundary};
use reqwest::StatusCode;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_POLYGON_URL: &str = "http://polygons.openstreetmap.fr";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Client for a polygons.openstreetmap.fr compatible service.
#[derive(Debug, Clone)]
pub struct PolygonService {
    client: reqwest::Client,
    base_url: String,
}

impl PolygonService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(PolygonService { client, base_url })
    }

    /// Fetches the `.poly` body for an area and checks that it is a polygon.
    pub async fn fetch(&self, area: AreaId) -> Result<(String, Boundary), StageError> {
        let url = format!("{}/get_poly.py", self.base_url);
        let id = area.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("id", id.as_str()), ("params", "0")])
            .send()
            .await
            .map_err(|source| StageError::Http { area, source })?;

        let status = response.status();
        info!(%area, status = status.as_u16(), "polygon request returned");
        if status != StatusCode::OK {
            return Err(StageError::PolygonStatus {
                area,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| StageError::Http { area, source })?;
        let boundary =
            poly::parse(&body).map_err(|source| StageError::Polygon { area, source })?;
        Ok((body, boundary))
    }
}

/// Resolves an area to its boundary polygon file. The service's response
/// body is stored verbatim.
#[instrument(skip(service, layout))]
pub async fn resolve_polygon(
    service: &PolygonService,
    layout: &Layout,
    area: AreaId,
    with_geojson: bool,
) -> Result<PathBuf, StageError> {
    let (body, boundary) = service.fetch(area).await?;
    if let Some(rect) = boundary.bounding_rect() {
        info!(
            rings = boundary.mp.0.len(),
            min_lng = rect.min().x,
            min_lat = rect.min().y,
            max_lng = rect.max().x,
            max_lat = rect.max().y,
            "polygon parsed"
        );
    }

    let path = layout.polygon(area);
    tokio::fs::write(&path, body)
        .await
        .map_err(|source| StageError::Io {
            path: path.clone(),
            source,
        })?;

    if with_geojson {
        let geojson_path = layout.geojson(area);
        write_geojson(&geojson_path, &boundary).map_err(|source| StageError::Io {
            path: geojson_path,
            source,
        })?;
    }
    Ok(path)
}

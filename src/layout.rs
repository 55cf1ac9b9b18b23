use super::area::AreaId;
use super::period::Period;
use std::path::{Path, PathBuf};

/// Where each stage writes its output. Names depend only on area and period.
#[derive(Debug, Clone)]
pub struct Layout {
    poly_dir: PathBuf,
    pbf_dir: PathBuf,
}

impl Layout {
    pub fn new(poly_dir: impl Into<PathBuf>, pbf_dir: impl Into<PathBuf>) -> Self {
        Layout {
            poly_dir: poly_dir.into(),
            pbf_dir: pbf_dir.into(),
        }
    }

    pub fn poly_dir(&self) -> &Path {
        &self.poly_dir
    }

    pub fn pbf_dir(&self) -> &Path {
        &self.pbf_dir
    }

    pub fn polygon(&self, area: AreaId) -> PathBuf {
        self.poly_dir.join(format!("{}.poly", area))
    }

    pub fn geojson(&self, area: AreaId) -> PathBuf {
        self.poly_dir.join(format!("{}.geojson", area))
    }

    pub fn history(&self, area: AreaId) -> PathBuf {
        self.pbf_dir.join(format!("{}.osm.pbf", area))
    }

    pub fn snapshot(&self, area: AreaId, period: &Period) -> PathBuf {
        self.pbf_dir
            .join(format!("{}.{}.osm.pbf", area, period.label()))
    }

    pub fn buildings(&self, area: AreaId, period: &Period) -> PathBuf {
        self.pbf_dir
            .join(format!("{}.{}.buildings.osm.pbf", area, period.label()))
    }
}

/// Prefix for the tables osm2pgsql creates for one area and period.
pub fn table_prefix(area: AreaId, period: &Period) -> String {
    format!("ex_{}_{}", period.label(), area)
}

use super::poly::Boundary;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::map::Map;
use serde_json::to_value;
use std::fs::write;
use std::path::Path;

impl Boundary {
    pub fn to_feature(&self) -> Feature {
        let properties = match to_value(&self.name) {
            Ok(value) => {
                let mut map = Map::new();
                map.insert("name".to_string(), value);
                Some(map)
            }
            _ => None,
        };

        let value = Value::from(&self.mp);
        let geometry = Geometry::new(value);

        Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties,
            foreign_members: None,
        }
    }
}

pub fn write_geojson(path: &Path, boundary: &Boundary) -> Result<(), std::io::Error> {
    let feature_collection = FeatureCollection {
        bbox: None,
        features: vec![boundary.to_feature()],
        foreign_members: None,
    };

    write(path, feature_collection.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly::parse;

    #[test]
    fn writes_named_multipolygon() {
        let boundary = parse("bremen\n1\n 8 53\n 9 53\n 9 54\nEND\nEND\n").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bremen.geojson");
        write_geojson(&path, &boundary).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        let feature = &json["features"][0];
        assert_eq!(feature["properties"]["name"], "bremen");
        assert_eq!(feature["geometry"]["type"], "MultiPolygon");
    }
}

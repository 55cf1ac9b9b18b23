//! Osmosis polygon filter files (`.poly`).
//!
//! A file starts with a name line, followed by rings. Each ring has a header
//! line, one `lon lat` pair per line and a closing `END`. Headers starting
//! with `!` are holes in the preceding outer ring. A final `END` closes the
//! file.

use geo::algorithm::bounding_rect::BoundingRect;
use geo_types::{Coord, LineString, MultiPolygon, Polygon, Rect};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum PolyError {
    #[error("empty polygon file")]
    Empty,
    #[error("missing END before end of file")]
    MissingEnd,
    #[error("line {line}: expected \"lon lat\", got {text:?}")]
    BadCoordinate { line: usize, text: String },
    #[error("line {line}: hole has no outer ring")]
    HoleWithoutOuter { line: usize },
    #[error("line {line}: ring needs at least 3 points, has {points}")]
    TooFewPoints { line: usize, points: usize },
    #[error("no rings")]
    NoRings,
}

#[derive(Debug, Clone)]
pub struct Boundary {
    pub name: String,
    pub mp: MultiPolygon<f64>,
}

impl Boundary {
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.mp.bounding_rect()
    }
}

struct Ring {
    line: usize,
    hole: bool,
    coords: Vec<Coord<f64>>,
}

pub fn parse(text: &str) -> Result<Boundary, PolyError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let name = match lines.next() {
        Some((_, "END")) | None => return Err(PolyError::Empty),
        Some((_, name)) => name.to_string(),
    };

    let mut polygons: Vec<Polygon<f64>> = vec![];
    loop {
        let (line, header) = lines.next().ok_or(PolyError::MissingEnd)?;
        if header == "END" {
            break;
        }
        let mut ring = Ring {
            line,
            hole: header.starts_with('!'),
            coords: vec![],
        };
        loop {
            let (line, text) = lines.next().ok_or(PolyError::MissingEnd)?;
            if text == "END" {
                break;
            }
            ring.coords.push(parse_coord(line, text)?);
        }
        add_ring(&mut polygons, ring)?;
    }

    if polygons.is_empty() {
        return Err(PolyError::NoRings);
    }
    Ok(Boundary {
        name,
        mp: MultiPolygon(polygons),
    })
}

fn parse_coord(line: usize, text: &str) -> Result<Coord<f64>, PolyError> {
    let bad = || PolyError::BadCoordinate {
        line,
        text: text.to_string(),
    };
    let mut parts = text.split_whitespace();
    let x = parts.next().and_then(|s| s.parse::<f64>().ok()).ok_or_else(bad)?;
    let y = parts.next().and_then(|s| s.parse::<f64>().ok()).ok_or_else(bad)?;
    if parts.next().is_some() {
        return Err(bad());
    }
    Ok(Coord { x, y })
}

fn add_ring(polygons: &mut Vec<Polygon<f64>>, ring: Ring) -> Result<(), PolyError> {
    let Ring { line, hole, coords } = ring;
    let mut distinct = coords.clone();
    distinct.dedup();
    if distinct.first() == distinct.last() && distinct.len() > 1 {
        distinct.pop();
    }
    if distinct.len() < 3 {
        return Err(PolyError::TooFewPoints {
            line,
            points: distinct.len(),
        });
    }
    let ring = LineString::from(coords);
    if hole {
        let outer = polygons
            .last_mut()
            .ok_or(PolyError::HoleWithoutOuter { line })?;
        outer.interiors_push(ring);
    } else {
        polygons.push(Polygon::new(ring, vec![]));
    }
    Ok(())
}

//! Rectilinear grids: latitude-longitude and rotated pole, optionally with altitude.

use crate::error::{CouplingError, Result};
use crate::store::Shape;
use serde::{Deserialize, Serialize};
use smallvec::smallvec;
use std::fmt;

/// Relative tolerance under which an extent is treated as an exact multiple of the resolution.
const SNAP_TOLERANCE: f64 = 1e-9;

/// One coordinate axis with its cell bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    name: String,
    units: String,
    coordinates: Vec<f64>,
    bounds: Vec<[f64; 2]>,
}

impl Axis {
    /// Bounds must abut exactly and run in one direction.
    pub fn new(name: &str, units: &str, coordinates: Vec<f64>, bounds: Vec<[f64; 2]>) -> Result<Self> {
        let err = |msg: String| CouplingError::Configuration(format!("{} axis: {}", name, msg));
        if coordinates.is_empty() {
            return Err(err("no coordinates".into()));
        }
        if coordinates.len() != bounds.len() {
            return Err(err(format!(
                "{} coordinates but {} bounds",
                coordinates.len(),
                bounds.len()
            )));
        }
        if coordinates.iter().chain(bounds.iter().flatten()).any(|v| !v.is_finite()) {
            return Err(err("non-finite coordinate or bound".into()));
        }
        let direction = (bounds[0][1] - bounds[0][0]).signum();
        if direction == 0.0 || bounds.iter().any(|b| (b[1] - b[0]).signum() != direction) {
            return Err(err("bounds are degenerate or not monotonic".into()));
        }
        if let Some(i) = bounds.windows(2).position(|w| w[0][1] != w[1][0]) {
            return Err(err(format!("bounds of cells {} and {} do not abut", i, i + 1)));
        }
        Ok(Self { name: name.to_string(), units: units.to_string(), coordinates, bounds })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    pub fn bounds(&self) -> &[[f64; 2]] {
        &self.bounds
    }

    /// Outer edges of the axis, in axis order.
    pub fn extent(&self) -> (f64, f64) {
        (self.bounds[0][0], self.bounds[self.bounds.len() - 1][1])
    }
}

/// Where a coordinate sits inside its cell when tiling an extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellLocation {
    #[default]
    Centre,
    LowerLeft,
    UpperLeft,
    LowerRight,
    UpperRight,
}

impl CellLocation {
    /// Fractions of a cell, along (y, x), from the cell's first edge to its coordinate.
    fn offsets(&self) -> (f64, f64) {
        match self {
            CellLocation::Centre => (0.5, 0.5),
            CellLocation::LowerLeft => (0.0, 0.0),
            CellLocation::UpperLeft => (1.0, 0.0),
            CellLocation::LowerRight => (0.0, 1.0),
            CellLocation::UpperRight => (1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridKind {
    LatLon,
    RotatedLatLon(RotatedPole),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotatedPole {
    pub grid_north_pole_latitude: f64,
    pub grid_north_pole_longitude: f64,
    pub earth_radius: f64,
}

/// Extent and resolution used to tile a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridExtent {
    pub y: (f64, f64),
    pub x: (f64, f64),
    pub y_resolution: f64,
    pub x_resolution: f64,
    pub altitude: Option<((f64, f64), f64)>,
    pub location: CellLocation,
}

impl GridExtent {
    pub fn new(y: (f64, f64), x: (f64, f64), y_resolution: f64, x_resolution: f64) -> Self {
        Self { y, x, y_resolution, x_resolution, altitude: None, location: CellLocation::Centre }
    }

    pub fn with_altitude(mut self, extent: (f64, f64), resolution: f64) -> Self {
        self.altitude = Some((extent, resolution));
        self
    }

    pub fn with_location(mut self, location: CellLocation) -> Self {
        self.location = location;
        self
    }
}

/// A rectilinear grid: y and x axes plus an optional vertical one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceDomain {
    kind: GridKind,
    z: Option<Axis>,
    y: Axis,
    x: Axis,
}

impl SpaceDomain {
    pub fn lat_lon(
        latitude: Vec<f64>,
        longitude: Vec<f64>,
        latitude_bounds: Vec<[f64; 2]>,
        longitude_bounds: Vec<[f64; 2]>,
    ) -> Result<Self> {
        let y = Axis::new("latitude", "degrees_north", latitude, latitude_bounds)?;
        let x = Axis::new("longitude", "degrees_east", longitude, longitude_bounds)?;
        Ok(Self { kind: GridKind::LatLon, z: None, y, x })
    }

    pub fn rotated_lat_lon(
        grid_latitude: Vec<f64>,
        grid_longitude: Vec<f64>,
        grid_latitude_bounds: Vec<[f64; 2]>,
        grid_longitude_bounds: Vec<[f64; 2]>,
        pole: RotatedPole,
    ) -> Result<Self> {
        if !(pole.earth_radius > 0.0) {
            return Err(CouplingError::Configuration(format!(
                "earth radius must be positive, got {}",
                pole.earth_radius
            )));
        }
        let y = Axis::new("grid_latitude", "degrees", grid_latitude, grid_latitude_bounds)?;
        let x = Axis::new("grid_longitude", "degrees", grid_longitude, grid_longitude_bounds)?;
        Ok(Self { kind: GridKind::RotatedLatLon(pole), z: None, y, x })
    }

    pub fn with_altitude(mut self, altitude: Vec<f64>, altitude_bounds: Vec<[f64; 2]>) -> Result<Self> {
        self.z = Some(Axis::new("altitude", "m", altitude, altitude_bounds)?);
        Ok(self)
    }

    /// Tiles a latitude-longitude grid over `extent`.
    ///
    /// An extent that is not an exact multiple of the resolution gains one
    /// more cell and its far edge moves outwards accordingly.
    pub fn from_extent_and_resolution(extent: &GridExtent) -> Result<Self> {
        let (lat, lat_bounds, lon, lon_bounds) = tile_horizontal(extent)?;
        let grid = Self::lat_lon(lat, lon, lat_bounds, lon_bounds)?;
        grid.tile_altitude(extent)
    }

    pub fn rotated_from_extent_and_resolution(extent: &GridExtent, pole: RotatedPole) -> Result<Self> {
        let (lat, lat_bounds, lon, lon_bounds) = tile_horizontal(extent)?;
        let grid = Self::rotated_lat_lon(lat, lon, lat_bounds, lon_bounds, pole)?;
        grid.tile_altitude(extent)
    }

    fn tile_altitude(self, extent: &GridExtent) -> Result<Self> {
        match extent.altitude {
            Some(((start, end), resolution)) => {
                let (coords, bounds) = tile_axis(start, end, resolution, 0.5)?;
                self.with_altitude(coords, bounds)
            }
            None => Ok(self),
        }
    }

    pub fn kind(&self) -> &GridKind {
        &self.kind
    }

    pub fn y(&self) -> &Axis {
        &self.y
    }

    pub fn x(&self) -> &Axis {
        &self.x
    }

    pub fn z(&self) -> Option<&Axis> {
        self.z.as_ref()
    }

    /// `[z?, y, x]`.
    pub fn shape(&self) -> Shape {
        match &self.z {
            Some(z) => smallvec![z.len(), self.y.len(), self.x.len()],
            None => smallvec![self.y.len(), self.x.len()],
        }
    }

    pub fn cell_count(&self) -> usize {
        self.shape().iter().product()
    }

    /// Compares grid kind, coordinates and bounds exactly; the vertical axis
    /// is skipped when `ignore_z` is set.
    pub fn is_space_equal_to(&self, other: &SpaceDomain, ignore_z: bool) -> bool {
        self.kind == other.kind
            && self.y == other.y
            && self.x == other.x
            && (ignore_z || self.z == other.z)
    }

    /// Human-readable reason the grids differ, if they do.
    pub fn difference_from(&self, other: &SpaceDomain, ignore_z: bool) -> Option<String> {
        if self.kind != other.kind {
            return Some(format!("grid kinds differ ({:?} vs {:?})", self.kind, other.kind));
        }
        for (mine, theirs) in [(&self.y, &other.y), (&self.x, &other.x)] {
            if mine.len() != theirs.len() {
                return Some(format!(
                    "{} lengths differ ({} vs {})",
                    mine.name,
                    mine.len(),
                    theirs.len()
                ));
            }
            if mine != theirs {
                return Some(format!("{} coordinates or bounds differ", mine.name));
            }
        }
        if !ignore_z && self.z != other.z {
            return Some("altitude axes differ".into());
        }
        None
    }
}

impl fmt::Display for SpaceDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.kind {
            GridKind::LatLon => "LatLonGrid",
            GridKind::RotatedLatLon(_) => "RotatedLatLonGrid",
        };
        writeln!(f, "{}(", name)?;
        writeln!(f, "    shape {{Y, X}}: ({}, {})", self.y.len(), self.x.len())?;
        if let Some(z) = &self.z {
            writeln!(f, "    Z, {} ({},): {:?} {}", z.name, z.len(), z.coordinates, z.units)?;
        }
        for axis in [&self.y, &self.x] {
            writeln!(
                f,
                "    {} ({},): {:?} {}",
                axis.name,
                axis.len(),
                axis.coordinates,
                axis.units
            )?;
        }
        if let GridKind::RotatedLatLon(pole) = &self.kind {
            writeln!(
                f,
                "    grid_north_pole: ({}, {}), earth_radius: {}",
                pole.grid_north_pole_latitude, pole.grid_north_pole_longitude, pole.earth_radius
            )?;
        }
        write!(f, ")")
    }
}

type Tiled = (Vec<f64>, Vec<[f64; 2]>, Vec<f64>, Vec<[f64; 2]>);

fn tile_horizontal(extent: &GridExtent) -> Result<Tiled> {
    let (y_offset, x_offset) = extent.location.offsets();
    let (y, y_bounds) = tile_axis(extent.y.0, extent.y.1, extent.y_resolution, y_offset)?;
    let (x, x_bounds) = tile_axis(extent.x.0, extent.x.1, extent.x_resolution, x_offset)?;
    Ok((y, y_bounds, x, x_bounds))
}

/// Splits `[start, end]` into cells of width `resolution`.
///
/// Edges are computed as `start ± i * resolution` so consecutive bounds share
/// the identical float. `offset` places each coordinate within its cell.
fn tile_axis(start: f64, end: f64, resolution: f64, offset: f64) -> Result<(Vec<f64>, Vec<[f64; 2]>)> {
    if !(resolution > 0.0) || !resolution.is_finite() {
        return Err(CouplingError::Configuration(format!(
            "resolution must be positive and finite, got {}",
            resolution
        )));
    }
    let span = end - start;
    if span == 0.0 || !span.is_finite() {
        return Err(CouplingError::Configuration(format!(
            "extent ({}, {}) is empty or not finite",
            start, end
        )));
    }
    let ratio = span.abs() / resolution;
    let nearest = ratio.round();
    let count = if (ratio - nearest).abs() <= SNAP_TOLERANCE * nearest.max(1.0) {
        nearest
    } else {
        ratio.ceil()
    } as usize;

    let direction = span.signum();
    let edge = |i: usize| start + direction * i as f64 * resolution;
    let bounds: Vec<[f64; 2]> = (0..count).map(|i| [edge(i), edge(i + 1)]).collect();
    let coordinates = (0..count)
        .map(|i| edge(i) + direction * offset * resolution)
        .collect();
    Ok((coordinates, bounds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12)
    }

    #[test]
    fn test_extent_and_resolution_centre() {
        let grid = SpaceDomain::from_extent_and_resolution(&GridExtent::new((30.0, 70.0), (0.0, 90.0), 5.0, 10.0))
            .unwrap();
        assert_eq!(grid.shape().as_slice(), &[8, 9]);
        assert!(close(grid.y().coordinates(), &[32.5, 37.5, 42.5, 47.5, 52.5, 57.5, 62.5, 67.5]));
        assert_eq!(grid.y().extent(), (30.0, 70.0));
        assert_eq!(grid.x().extent(), (0.0, 90.0));
    }

    #[rstest]
    #[case(CellLocation::LowerLeft, 30.0, 0.0)]
    #[case(CellLocation::UpperRight, 35.0, 10.0)]
    #[case(CellLocation::UpperLeft, 35.0, 0.0)]
    fn test_cell_location_offsets(#[case] location: CellLocation, #[case] first_y: f64, #[case] first_x: f64) {
        let extent = GridExtent::new((30.0, 70.0), (0.0, 90.0), 5.0, 10.0).with_location(location);
        let grid = SpaceDomain::from_extent_and_resolution(&extent).unwrap();
        assert_eq!(grid.y().coordinates()[0], first_y);
        assert_eq!(grid.x().coordinates()[0], first_x);
        assert_eq!(grid.y().extent(), (30.0, 70.0));
    }

    #[test]
    fn test_non_multiple_extent_rounds_up() {
        let grid = SpaceDomain::from_extent_and_resolution(&GridExtent::new((0.0, 1.0), (0.0, 1.0), 0.3, 0.25))
            .unwrap();
        assert_eq!(grid.shape().as_slice(), &[4, 4]);
        assert!((grid.y().extent().1 - 1.2).abs() < 1e-12);
        assert_eq!(grid.x().extent().1, 1.0);
    }

    #[test]
    fn test_descending_extent_and_altitude() {
        let extent = GridExtent::new((70.0, 30.0), (0.0, 90.0), 5.0, 10.0).with_altitude((0.0, 20.0), 10.0);
        let grid = SpaceDomain::from_extent_and_resolution(&extent).unwrap();
        assert_eq!(grid.shape().as_slice(), &[2, 8, 9]);
        assert_eq!(grid.y().coordinates()[0], 67.5);
        assert_eq!(grid.z().unwrap().coordinates(), &[5.0, 15.0]);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    fn test_invalid_resolution(#[case] resolution: f64) {
        let extent = GridExtent::new((0.0, 10.0), (0.0, 10.0), resolution, 1.0);
        assert!(SpaceDomain::from_extent_and_resolution(&extent).is_err());
    }

    #[test]
    fn test_axis_rejects_gapped_bounds() {
        let res = Axis::new("latitude", "degrees_north", vec![0.5, 2.5], vec![[0.0, 1.0], [2.0, 3.0]]);
        assert!(res.is_err());
    }

    #[test]
    fn test_space_equality_properties() {
        let make = |res: f64| {
            SpaceDomain::from_extent_and_resolution(&GridExtent::new((51.0, 55.0), (-2.0, 1.0), res, 1.0)).unwrap()
        };
        let a = make(1.0);
        let b = make(1.0);
        assert!(a.is_space_equal_to(&a, false));
        assert!(a.is_space_equal_to(&b, false) && b.is_space_equal_to(&a, false));
        assert!(!a.is_space_equal_to(&make(0.5), false));

        let mut lat = a.y().coordinates().to_vec();
        lat[2] += 1e-9;
        let perturbed =
            SpaceDomain::lat_lon(lat, a.x().coordinates().to_vec(), a.y().bounds().to_vec(), a.x().bounds().to_vec())
                .unwrap();
        assert!(!a.is_space_equal_to(&perturbed, false));
    }

    #[test]
    fn test_ignore_z() {
        let flat = SpaceDomain::from_extent_and_resolution(&GridExtent::new((0.0, 2.0), (0.0, 2.0), 1.0, 1.0)).unwrap();
        let layered = flat.clone().with_altitude(vec![0.5], vec![[0.0, 1.0]]).unwrap();
        assert!(flat.is_space_equal_to(&layered, true));
        assert!(!flat.is_space_equal_to(&layered, false));
    }

    #[test]
    fn test_rotated_pole_must_match() {
        let extent = GridExtent::new((-1.0, 1.0), (-1.0, 1.0), 0.5, 0.5);
        let pole = RotatedPole {
            grid_north_pole_latitude: 38.0,
            grid_north_pole_longitude: 190.0,
            earth_radius: 6_371_007.0,
        };
        let a = SpaceDomain::rotated_from_extent_and_resolution(&extent, pole).unwrap();
        let b = SpaceDomain::rotated_from_extent_and_resolution(
            &extent,
            RotatedPole { grid_north_pole_latitude: 39.0, ..pole },
        )
        .unwrap();
        let c = SpaceDomain::from_extent_and_resolution(&extent).unwrap();
        assert!(!a.is_space_equal_to(&b, true));
        assert!(a.difference_from(&c, true).is_some());
        assert_eq!(a.difference_from(&a.clone(), true), None);
    }
}

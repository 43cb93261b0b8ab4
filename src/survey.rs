//! Selecting agricultural buildings from a BD TOPO building table and
//! producing the review input file.
//!
//! The input is expected to be already reduced to WGS84 centroids (`lat`,
//! `lon`); reprojection and centroid computation happen upstream in GIS
//! tooling.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use tracing::info;

use crate::models::{google_maps_link, Record};

/// Montpellier city centre, the default reference point for the radius filter.
pub const MONTPELLIER: (f64, f64) = (43.61825180053711, 3.8813648223876953);

/// WGS84 mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_008.8;
/// Sphere radius of the Web Mercator (EPSG:3857) projection.
const MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// `etat_de_l_objet` values that mark a building as abandoned.
const ABANDONED_STATES: [&str; 4] = ["Désaffecté", "En ruine", "Détruit", "Inconnu"];

/// One row of the building table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Building {
    pub cleabs: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub usage_1: String,
    #[serde(default)]
    pub nature: String,
    #[serde(default)]
    pub etat_de_l_objet: String,
    #[serde(default)]
    pub nombre_de_logements: Option<f64>,
}

/// The three selections produced from the building table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Category {
    /// Primary usage declared as agricultural.
    Usage,
    /// Nature mentions agriculture, or is a greenhouse or silo.
    Nature,
    /// Abandoned, ruined, destroyed, or agricultural with no dwelling.
    Abandon,
}

impl Category {
    pub fn matches(self, building: &Building) -> bool {
        let agricultural_usage = building.usage_1 == "Agricole";
        match self {
            Category::Usage => agricultural_usage,
            Category::Nature => {
                building.nature.to_lowercase().contains("agricole")
                    || matches!(building.nature.as_str(), "Serre" | "Silo")
            }
            Category::Abandon => {
                ABANDONED_STATES.contains(&building.etat_de_l_objet.as_str())
                    || (agricultural_usage && building.nombre_de_logements == Some(0.0))
            }
        }
    }
}

/// Great-circle distance in metres between two WGS84 points.
pub fn distance_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

/// Project a WGS84 point to Web Mercator metres `(x, y)`.
pub fn web_mercator(point: (f64, f64)) -> (f64, f64) {
    let (lat, lon) = (point.0.to_radians(), point.1.to_radians());
    let y = (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
    (MERCATOR_RADIUS_M * lon, MERCATOR_RADIUS_M * y)
}

/// How the radius filter measures distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DistanceMetric {
    /// Great-circle distance on the ground.
    #[default]
    Geodesic,
    /// Straight line in Web Mercator metres. Overstates ground distance by
    /// about 1/cos(latitude), roughly 1.38 around Montpellier. Matches the
    /// selections made by the earlier GIS scripts.
    Mercator,
}

impl DistanceMetric {
    pub fn distance_m(self, from: (f64, f64), to: (f64, f64)) -> f64 {
        match self {
            DistanceMetric::Geodesic => distance_m(from, to),
            DistanceMetric::Mercator => {
                let (x1, y1) = web_mercator(from);
                let (x2, y2) = web_mercator(to);
                (x2 - x1).hypot(y2 - y1)
            }
        }
    }
}

/// Parameters of one selection run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub category: Category,
    pub center: (f64, f64),
    /// `None` disables the radius filter.
    pub max_distance_km: Option<f64>,
    pub metric: DistanceMetric,
}

impl Selection {
    pub fn keeps(&self, building: &Building) -> bool {
        let close_enough = self.max_distance_km.map_or(true, |km| {
            self.metric
                .distance_m(self.center, (building.lat, building.lon))
                <= km * 1000.0
        });
        close_enough && self.category.matches(building)
    }

    /// Selected buildings as review records, map links included.
    pub fn apply(&self, buildings: &[Building]) -> Vec<Record> {
        buildings
            .iter()
            .filter(|building| self.keeps(building))
            .map(|building| Record {
                cleabs: building.cleabs.clone(),
                lat: building.lat,
                lon: building.lon,
                google_maps: google_maps_link(building.lat, building.lon),
                usage_1: building.usage_1.clone(),
                nature: building.nature.clone(),
                etat_de_l_objet: building.etat_de_l_objet.clone(),
            })
            .collect()
    }
}

pub fn read_buildings<R: Read>(reader: R) -> Result<Vec<Building>> {
    csv::Reader::from_reader(reader)
        .deserialize::<Building>()
        .enumerate()
        .map(|(line, row)| row.with_context(|| format!("invalid building on line {}", line + 2)))
        .collect()
}

/// Write records in the review input format.
pub fn write_records<W: Write>(records: &[Record], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)
            .with_context(|| format!("failed to write record {}", record.cleabs))?;
    }
    wtr.flush().context("failed to flush records")?;
    Ok(())
}

/// Run a selection from `input` to `output`, returning `(read, kept)`.
pub fn select_file(selection: &Selection, input: &Path, output: &Path) -> Result<(usize, usize)> {
    let file = File::open(input)
        .with_context(|| format!("failed to open building file {}", input.display()))?;
    let buildings = read_buildings(file)
        .with_context(|| format!("failed to load buildings from {}", input.display()))?;

    let records = selection.apply(&buildings);

    let out = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    write_records(&records, BufWriter::new(out))?;

    info!(
        category = ?selection.category,
        read = buildings.len(),
        kept = records.len(),
        output = %output.display(),
        "selection written"
    );
    Ok((buildings.len(), records.len()))
}

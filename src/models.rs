//! Domain models shared by the ledger, the filters, and the review TUI. The
//! types stay light-weight data holders so the other layers can focus on
//! persistence and presentation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One building from the review input file. Loaded once at startup and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable BD TOPO identifier; also the ledger's primary key.
    pub cleabs: String,
    pub lat: f64,
    pub lon: f64,
    /// Pre-built map link. Older exports may lack it, in which case it is
    /// derived from the coordinates on demand.
    #[serde(default)]
    pub google_maps: String,
    #[serde(default)]
    pub usage_1: String,
    #[serde(default)]
    pub nature: String,
    #[serde(default)]
    pub etat_de_l_objet: String,
}

impl Record {
    /// Column names in the order they are written to CSV.
    pub const COLUMNS: [&'static str; 7] = [
        "cleabs",
        "lat",
        "lon",
        "google_maps",
        "usage_1",
        "nature",
        "etat_de_l_objet",
    ];

    /// Link opened by the `g` shortcut.
    pub fn map_link(&self) -> String {
        if self.google_maps.trim().is_empty() {
            google_maps_link(self.lat, self.lon)
        } else {
            self.google_maps.clone()
        }
    }

    /// Field values aligned with [`Record::COLUMNS`].
    pub fn values(&self) -> [String; 7] {
        [
            self.cleabs.clone(),
            self.lat.to_string(),
            self.lon.to_string(),
            self.google_maps.clone(),
            self.usage_1.clone(),
            self.nature.clone(),
            self.etat_de_l_objet.clone(),
        ]
    }
}

/// Build a Google Maps query link for a WGS84 point.
pub fn google_maps_link(lat: f64, lon: f64) -> String {
    format!("https://www.google.com/maps?q={lat},{lon}")
}

/// Human decision recorded for a building. "Unset" is not a variant: it is
/// the absence of a ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReviewStatus {
    Validated,
    Rejected,
    /// Any other label found in the `validation` column, kept verbatim. The
    /// building counts as evaluated but matches no specific status filter.
    Other(String),
}

impl ReviewStatus {
    /// The two decisions a reviewer can make.
    pub const ALL: [ReviewStatus; 2] = [ReviewStatus::Validated, ReviewStatus::Rejected];

    /// Label persisted in the `validation` column. These strings are shared
    /// with ledgers written by the earlier survey tooling and must not change.
    pub fn label(&self) -> &str {
        match self {
            ReviewStatus::Validated => "Validé",
            ReviewStatus::Rejected => "Refusé",
            ReviewStatus::Other(label) => label,
        }
    }

    /// Read a stored label. Unrecognised labels become [`ReviewStatus::Other`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "Validé" => ReviewStatus::Validated,
            "Refusé" => ReviewStatus::Rejected,
            other => ReviewStatus::Other(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ReviewStatus::Other(_))
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A row of the `validation` table. At most one exists per `cleabs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub cleabs: String,
    pub status: ReviewStatus,
    pub comment: Option<String>,
}

impl LedgerEntry {
    pub fn new(cleabs: impl Into<String>, status: ReviewStatus, comment: Option<String>) -> Self {
        Self {
            cleabs: cleabs.into(),
            status,
            comment,
        }
    }
}

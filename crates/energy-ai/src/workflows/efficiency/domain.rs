use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Building categories with published benchmark ranges.
///
/// Unrecognised categories are preserved as `Other` so the evaluator can reject them
/// with a precise error instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildingType {
    School,
    University,
    Hotel,
    Residential,
    Office,
    Hospital,
    Other(String),
}

impl BuildingType {
    pub const STANDARD: [BuildingType; 6] = [
        BuildingType::School,
        BuildingType::University,
        BuildingType::Hotel,
        BuildingType::Residential,
        BuildingType::Office,
        BuildingType::Hospital,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "school" => Self::School,
            "university" => Self::University,
            "hotel" => Self::Hotel,
            "residential" => Self::Residential,
            "office" => Self::Office,
            "hospital" => Self::Hospital,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::School => "school",
            Self::University => "university",
            Self::Hotel => "hotel",
            Self::Residential => "residential",
            Self::Office => "office",
            Self::Hospital => "hospital",
            Self::Other(value) => value.as_str(),
        }
    }

    /// Capitalized name used in report headings.
    pub fn label(&self) -> String {
        let mut chars = self.as_str().chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl From<String> for BuildingType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<BuildingType> for String {
    fn from(value: BuildingType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_period_months() -> f64 {
    12.0
}

/// One analysis request: building metadata plus consumption for a measurement period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingProfile {
    pub building_type: BuildingType,
    pub building_area_m2: f64,
    pub total_energy_kwh: f64,
    #[serde(default = "default_period_months")]
    pub period_months: f64,
    #[serde(default)]
    pub occupancy: Option<i64>,
    #[serde(default)]
    pub climate_zone: Option<String>,
}

impl BuildingProfile {
    pub fn new(building_type: BuildingType, building_area_m2: f64, total_energy_kwh: f64) -> Self {
        Self {
            building_type,
            building_area_m2,
            total_energy_kwh,
            period_months: default_period_months(),
            occupancy: None,
            climate_zone: None,
        }
    }

    pub fn with_period_months(mut self, period_months: f64) -> Self {
        self.period_months = period_months;
        self
    }

    pub fn with_occupancy(mut self, occupancy: i64) -> Self {
        self.occupancy = Some(occupancy);
        self
    }

    pub fn with_climate_zone(mut self, zone: impl Into<String>) -> Self {
        self.climate_zone = Some(zone.into());
        self
    }

    /// Occupant count used for per-person metrics; missing or non-positive counts clamp to one.
    pub fn effective_occupancy(&self) -> u64 {
        self.occupancy.unwrap_or(1).max(1) as u64
    }
}

/// Normalized energy metrics derived from a [`BuildingProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSet {
    pub total_energy_kwh: f64,
    pub building_area_m2: f64,
    pub period_months: f64,
    pub occupancy: u64,
    pub energy_per_sqm_kwh: f64,
    pub annual_energy_per_sqm_kwh: f64,
    pub energy_per_occupant_kwh: f64,
    pub climate_factor: f64,
    pub climate_adjusted_energy_per_sqm_kwh: f64,
}

/// Efficiency classes ordered from most to least efficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyLabel {
    Efficient,
    ModeratelyEfficient,
    Inefficient,
}

impl EfficiencyLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Efficient => "efficient",
            Self::ModeratelyEfficient => "moderately_efficient",
            Self::Inefficient => "inefficient",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Efficient => "efficient",
            Self::ModeratelyEfficient => "moderately efficient",
            Self::Inefficient => "inefficient",
        }
    }

    pub fn rating(&self) -> &'static str {
        match self {
            Self::Efficient => "excellent",
            Self::ModeratelyEfficient => "average",
            Self::Inefficient => "poor",
        }
    }
}

impl fmt::Display for EfficiencyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Threshold triple (kWh/m²/year) delimiting the efficiency bands of one building type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkBand {
    pub low: f64,
    pub moderate: f64,
    pub high: f64,
}

impl BenchmarkBand {
    pub const fn new(low: f64, moderate: f64, high: f64) -> Self {
        Self {
            low,
            moderate,
            high,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let ordered = self.low > 0.0 && self.low < self.moderate && self.moderate < self.high;
        if ordered && self.high.is_finite() {
            Ok(())
        } else {
            Err(format!(
                "thresholds must satisfy 0 < low < moderate < high (got {}, {}, {})",
                self.low, self.moderate, self.high
            ))
        }
    }
}

/// Range of the band a verdict fell into; `upper` is absent for the open inefficient band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandRange {
    pub lower: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

/// Classification of a building against its benchmark band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyVerdict {
    pub building_type: BuildingType,
    pub label: EfficiencyLabel,
    pub rating: &'static str,
    pub score: f64,
    pub annual_energy_per_sqm_kwh: f64,
    pub matched_range: BandRange,
    pub benchmarks: BenchmarkBand,
    pub potential_savings_percent: f64,
}

/// Request-level failures surfaced to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no benchmark entry for building type '{0}'")]
    UnknownBuildingType(BuildingType),
}

/// Failures while loading the static tables at startup.
#[derive(Debug, thiserror::Error)]
pub enum TableLoadError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed CSV in {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },
    #[error("invalid entry in {origin}: {detail}")]
    Invalid { origin: String, detail: String },
}

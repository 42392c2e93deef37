use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::super::domain::{BenchmarkBand, BuildingType, TableLoadError};

/// Reference intensity ranges (kWh/m²/year) keyed by building type.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkTable {
    bands: BTreeMap<BuildingType, BenchmarkBand>,
}

impl BenchmarkTable {
    /// Engineering-norm thresholds used when no table file is configured.
    pub fn standard() -> Self {
        Self {
            bands: BTreeMap::from([
                (BuildingType::School, BenchmarkBand::new(80.0, 120.0, 150.0)),
                (BuildingType::University, BenchmarkBand::new(100.0, 150.0, 200.0)),
                (BuildingType::Hotel, BenchmarkBand::new(120.0, 180.0, 250.0)),
                (BuildingType::Residential, BenchmarkBand::new(60.0, 100.0, 150.0)),
                (BuildingType::Office, BenchmarkBand::new(100.0, 150.0, 200.0)),
                (BuildingType::Hospital, BenchmarkBand::new(150.0, 250.0, 350.0)),
            ]),
        }
    }

    pub fn from_bands<I>(bands: I) -> Result<Self, TableLoadError>
    where
        I: IntoIterator<Item = (BuildingType, BenchmarkBand)>,
    {
        let mut table = BTreeMap::new();
        for (building_type, band) in bands {
            band.validate().map_err(|detail| TableLoadError::Invalid {
                origin: "benchmark table".to_string(),
                detail: format!("{building_type}: {detail}"),
            })?;
            table.insert(building_type, band);
        }
        Ok(Self { bands: table })
    }

    /// Parses a JSON object of `{"<type>": {"low": .., "moderate": .., "high": ..}}`.
    pub fn from_json_str(raw: &str, origin: &str) -> Result<Self, TableLoadError> {
        let parsed: BTreeMap<String, BenchmarkBand> =
            serde_json::from_str(raw).map_err(|source| TableLoadError::Json {
                origin: origin.to_string(),
                source,
            })?;

        Self::from_bands(
            parsed
                .into_iter()
                .map(|(key, band)| (BuildingType::parse(&key), band)),
        )
        .map_err(|err| match err {
            TableLoadError::Invalid { detail, .. } => TableLoadError::Invalid {
                origin: origin.to_string(),
                detail,
            },
            other => other,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableLoadError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| TableLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, &path.display().to_string())
    }

    pub fn get(&self, building_type: &BuildingType) -> Option<&BenchmarkBand> {
        self.bands.get(building_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BuildingType, &BenchmarkBand)> {
        self.bands.iter()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

impl Default for BenchmarkTable {
    fn default() -> Self {
        Self::standard()
    }
}

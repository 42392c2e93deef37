//! Auxiliary reference records used for benchmarking context.
//!
//! The dataset never changes how KPIs or verdicts are computed; it only supplies
//! comparable buildings for prompts and the dataset endpoints.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{AnalysisError, BuildingType, TableLoadError};

const BUILTIN_RECORDS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/data/reference_dataset.csv"
));

const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2000..=2100;

/// One annual consumption record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub year: i32,
    pub building_type: BuildingType,
    pub total_energy_kwh: f64,
    #[serde(default)]
    pub building_area_m2: Option<f64>,
    #[serde(default)]
    pub source: String,
}

impl ReferenceRecord {
    pub fn energy_per_sqm_kwh(&self) -> Option<f64> {
        self.building_area_m2
            .filter(|area| *area > 0.0)
            .map(|area| self.total_energy_kwh / area)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Summary {
    fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        (count > 0).then(|| Self {
            min,
            max,
            mean: sum / count as f64,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub count: usize,
    pub total_energy_kwh: Option<Summary>,
    pub building_area_m2: Option<Summary>,
    pub energy_per_sqm_kwh: Option<Summary>,
}

/// Record close to a queried intensity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarRecord {
    pub year: i32,
    pub building_type: BuildingType,
    pub total_energy_kwh: f64,
    pub building_area_m2: f64,
    pub energy_per_sqm_kwh: f64,
}

/// Position of a caller-supplied building inside the dataset distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetComparison {
    pub building_type: Option<BuildingType>,
    pub your_energy_per_sqm_kwh: f64,
    pub dataset_stats: Option<Summary>,
    pub within_dataset_range: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceDataset {
    records: Vec<ReferenceRecord>,
}

impl ReferenceDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Result<Self, TableLoadError> {
        Self::from_reader(BUILTIN_RECORDS.as_bytes(), "built-in reference dataset")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TableLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(reader: R, origin: &str) -> Result<Self, TableLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (index, row) in csv_reader.deserialize::<ReferenceRecord>().enumerate() {
            let record = row.map_err(|source| TableLoadError::Csv {
                origin: origin.to_string(),
                source,
            })?;
            validate(&record).map_err(|detail| TableLoadError::Invalid {
                origin: origin.to_string(),
                detail: format!("row {}: {detail}", index + 1),
            })?;
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> DatasetStats {
        stats_of(self.records.iter())
    }

    /// Up to `limit` records nearest to `energy_per_sqm` among the same building type,
    /// or among every record with an area when the type has none.
    pub fn similar(
        &self,
        building_type: &BuildingType,
        energy_per_sqm: f64,
        limit: usize,
    ) -> Vec<SimilarRecord> {
        let with_area: Vec<(&ReferenceRecord, f64, f64)> = self
            .records
            .iter()
            .filter_map(|record| {
                let area = record.building_area_m2.filter(|area| *area > 0.0)?;
                Some((record, area, record.total_energy_kwh / area))
            })
            .collect();

        let typed: Vec<_> = with_area
            .iter()
            .filter(|(record, _, _)| &record.building_type == building_type)
            .copied()
            .collect();
        let mut candidates = if typed.is_empty() { with_area } else { typed };

        candidates.sort_by(|left, right| {
            let left_gap = (left.2 - energy_per_sqm).abs();
            let right_gap = (right.2 - energy_per_sqm).abs();
            left_gap.total_cmp(&right_gap)
        });

        candidates
            .into_iter()
            .take(limit)
            .map(|(record, area, intensity)| SimilarRecord {
                year: record.year,
                building_type: record.building_type.clone(),
                total_energy_kwh: record.total_energy_kwh,
                building_area_m2: area,
                energy_per_sqm_kwh: round2(intensity),
            })
            .collect()
    }

    /// Compares one building's intensity with the dataset, narrowed to its type when
    /// the dataset holds records of that type.
    pub fn compare(
        &self,
        total_energy_kwh: f64,
        building_area_m2: f64,
        building_type: Option<&BuildingType>,
    ) -> Result<DatasetComparison, AnalysisError> {
        if !building_area_m2.is_finite() || building_area_m2 <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "building_area_m2 must be greater than zero (got {building_area_m2})"
            )));
        }
        if !total_energy_kwh.is_finite() || total_energy_kwh < 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "total_energy_kwh must be zero or positive (got {total_energy_kwh})"
            )));
        }

        let energy_per_sqm = total_energy_kwh / building_area_m2;
        let typed = building_type.map(|building_type| {
            stats_of(
                self.records
                    .iter()
                    .filter(|record| &record.building_type == building_type),
            )
        });
        let stats = match typed {
            Some(stats) if stats.energy_per_sqm_kwh.is_some() => stats,
            _ => self.stats(),
        };

        Ok(DatasetComparison {
            building_type: building_type.cloned(),
            your_energy_per_sqm_kwh: round2(energy_per_sqm),
            dataset_stats: stats.energy_per_sqm_kwh,
            within_dataset_range: stats
                .energy_per_sqm_kwh
                .map(|summary| summary.contains(energy_per_sqm)),
        })
    }
}

fn stats_of<'a>(records: impl Iterator<Item = &'a ReferenceRecord> + Clone) -> DatasetStats {
    DatasetStats {
        count: records.clone().count(),
        total_energy_kwh: Summary::of(records.clone().map(|record| record.total_energy_kwh)),
        building_area_m2: Summary::of(
            records
                .clone()
                .filter_map(|record| record.building_area_m2.filter(|area| *area > 0.0)),
        ),
        energy_per_sqm_kwh: Summary::of(
            records.filter_map(ReferenceRecord::energy_per_sqm_kwh),
        ),
    }
}

fn validate(record: &ReferenceRecord) -> Result<(), String> {
    if !YEAR_RANGE.contains(&record.year) {
        return Err(format!("year {} outside 2000-2100", record.year));
    }
    if !record.total_energy_kwh.is_finite() || record.total_energy_kwh <= 0.0 {
        return Err(format!(
            "total_energy_kwh must be positive (got {})",
            record.total_energy_kwh
        ));
    }
    if let Some(area) = record.building_area_m2 {
        if !area.is_finite() || area <= 0.0 {
            return Err(format!("building_area_m2 must be positive (got {area})"));
        }
    }
    Ok(())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn dataset() -> ReferenceDataset {
        ReferenceDataset::builtin().expect("built-in dataset parses")
    }

    #[test]
    fn builtin_dataset_includes_area_less_records() {
        let dataset = dataset();
        assert_eq!(dataset.len(), 10);
        assert!(dataset
            .records()
            .iter()
            .any(|record| record.building_area_m2.is_none()));
    }

    #[test]
    fn stats_ignore_records_without_area_for_intensity() {
        let stats = dataset().stats();
        assert_eq!(stats.count, 10);

        let intensity = stats.energy_per_sqm_kwh.expect("intensity summary");
        assert!((intensity.min - 70.676).abs() < 0.01);
        assert!((intensity.max - 180.0).abs() < 0.01);

        let area = stats.building_area_m2.expect("area summary");
        assert_eq!(area.min, 3200.0);
        assert_eq!(area.max, 10_200.0);
    }

    #[test]
    fn similar_prefers_same_type_and_nearest_intensity() {
        let similar = dataset().similar(&BuildingType::Hospital, 70.68, 2);
        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].year, 2024);
        assert_eq!(similar[0].energy_per_sqm_kwh, 70.68);
        assert_eq!(similar[1].year, 2023);
    }

    #[test]
    fn similar_falls_back_to_all_types() {
        let similar = dataset().similar(&BuildingType::Residential, 95.0, 1);
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].building_type, BuildingType::School);
    }

    #[test]
    fn compare_reports_range_membership() {
        let dataset = dataset();
        let inside = dataset
            .compare(720_893.0, 10_200.0, Some(&BuildingType::Hospital))
            .expect("valid input");
        assert_eq!(inside.within_dataset_range, Some(true));
        assert_eq!(inside.your_energy_per_sqm_kwh, 70.68);

        let outside = dataset
            .compare(2_000_000.0, 10_200.0, Some(&BuildingType::Hospital))
            .expect("valid input");
        assert_eq!(outside.within_dataset_range, Some(false));

        assert!(matches!(
            dataset.compare(1000.0, 0.0, None),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_dataset_yields_no_range() {
        let comparison = ReferenceDataset::empty()
            .compare(1000.0, 10.0, None)
            .expect("valid input");
        assert_eq!(comparison.dataset_stats, None);
        assert_eq!(comparison.within_dataset_range, None);
    }

    #[test]
    fn rejects_rows_outside_year_range() {
        let csv = "year,building_type,total_energy_kwh,building_area_m2,source\n1990,office,1000,100,x\n";
        let err = ReferenceDataset::from_reader(Cursor::new(csv), "inline")
            .expect_err("year rejected");
        assert!(err.to_string().contains("row 1"));
    }
}

use std::collections::BTreeMap;

use super::domain::{AnalysisError, BuildingProfile, KpiSet};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Multiplicative factors normalizing annual intensity to a reference climate.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateTable {
    factors: BTreeMap<String, f64>,
}

impl ClimateTable {
    pub fn standard() -> Self {
        Self::from_factors([
            ("hot", 0.95),
            ("mild", 1.0),
            ("temperate", 1.0),
            ("cold", 0.85),
            ("very_cold", 0.75),
        ])
    }

    pub fn from_factors<I, K>(factors: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let factors = factors
            .into_iter()
            .map(|(zone, factor)| (normalize_zone(&zone.into()), factor))
            .collect();
        Self { factors }
    }

    /// Factor for `zone`; unknown or absent zones leave values unchanged.
    pub fn factor(&self, zone: Option<&str>) -> f64 {
        zone.and_then(|zone| self.factors.get(&normalize_zone(zone)))
            .copied()
            .unwrap_or(1.0)
    }

    pub fn zones(&self) -> impl Iterator<Item = (&str, f64)> {
        self.factors
            .iter()
            .map(|(zone, factor)| (zone.as_str(), *factor))
    }
}

impl Default for ClimateTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn normalize_zone(zone: &str) -> String {
    zone.trim().to_ascii_lowercase().replace(|c: char| c == ' ' || c == '-', "_")
}

/// Stateless calculator turning a building profile into normalized KPIs.
#[derive(Debug, Clone, Default)]
pub struct KpiCalculator {
    climate: ClimateTable,
}

impl KpiCalculator {
    pub fn new(climate: ClimateTable) -> Self {
        Self { climate }
    }

    pub fn climate(&self) -> &ClimateTable {
        &self.climate
    }

    pub fn calculate(&self, profile: &BuildingProfile) -> Result<KpiSet, AnalysisError> {
        validate(profile)?;

        let energy_per_sqm = profile.total_energy_kwh / profile.building_area_m2;
        let annual_energy_per_sqm = annualize(energy_per_sqm, profile.period_months);
        let occupancy = profile.effective_occupancy();
        let climate_factor = self.climate.factor(profile.climate_zone.as_deref());

        Ok(KpiSet {
            total_energy_kwh: profile.total_energy_kwh,
            building_area_m2: profile.building_area_m2,
            period_months: profile.period_months,
            occupancy,
            energy_per_sqm_kwh: energy_per_sqm,
            annual_energy_per_sqm_kwh: annual_energy_per_sqm,
            energy_per_occupant_kwh: profile.total_energy_kwh / occupancy as f64,
            climate_factor,
            climate_adjusted_energy_per_sqm_kwh: annual_energy_per_sqm * climate_factor,
        })
    }
}

/// Scales a per-period value to a twelve-month equivalent.
pub fn annualize(value: f64, period_months: f64) -> f64 {
    if period_months == MONTHS_PER_YEAR {
        value
    } else {
        value * (MONTHS_PER_YEAR / period_months)
    }
}

fn validate(profile: &BuildingProfile) -> Result<(), AnalysisError> {
    if !profile.building_area_m2.is_finite() || profile.building_area_m2 <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "building_area_m2 must be greater than zero (got {})",
            profile.building_area_m2
        )));
    }

    if !profile.period_months.is_finite() || !(1.0..=MONTHS_PER_YEAR).contains(&profile.period_months)
    {
        return Err(AnalysisError::InvalidInput(format!(
            "period_months must be between 1 and 12 (got {})",
            profile.period_months
        )));
    }

    if !profile.total_energy_kwh.is_finite() || profile.total_energy_kwh < 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "total_energy_kwh must be zero or positive (got {})",
            profile.total_energy_kwh
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::efficiency::domain::BuildingType;

    fn hospital(period_months: f64) -> BuildingProfile {
        BuildingProfile::new(BuildingType::Hospital, 10_200.0, 720_893.0)
            .with_period_months(period_months)
    }

    #[test]
    fn annual_period_leaves_intensity_unchanged() {
        let kpis = KpiCalculator::default()
            .calculate(&hospital(12.0))
            .expect("valid profile");

        assert!((kpis.energy_per_sqm_kwh - 70.68).abs() < 0.01);
        assert_eq!(kpis.annual_energy_per_sqm_kwh, kpis.energy_per_sqm_kwh);
    }

    #[test]
    fn half_year_period_doubles_annual_intensity() {
        let kpis = KpiCalculator::default()
            .calculate(&hospital(6.0))
            .expect("valid profile");

        assert!((kpis.energy_per_sqm_kwh - 70.68).abs() < 0.01);
        assert!((kpis.annual_energy_per_sqm_kwh - kpis.energy_per_sqm_kwh * 2.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_positive_area() {
        let profile = BuildingProfile::new(BuildingType::Office, 0.0, 1000.0);
        match KpiCalculator::default().calculate(&profile) {
            Err(AnalysisError::InvalidInput(message)) => {
                assert!(message.contains("building_area_m2"))
            }
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[test]
    fn rejects_period_outside_one_to_twelve_months() {
        for months in [0.0, 0.5, 12.5, 24.0, f64::NAN] {
            let profile = hospital(months);
            assert!(
                matches!(
                    KpiCalculator::default().calculate(&profile),
                    Err(AnalysisError::InvalidInput(_))
                ),
                "period {months} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_negative_consumption() {
        let profile = BuildingProfile::new(BuildingType::School, 500.0, -1.0);
        assert!(matches!(
            KpiCalculator::default().calculate(&profile),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn non_positive_occupancy_is_clamped_not_rejected() {
        let profile = BuildingProfile::new(BuildingType::School, 2000.0, 50_000.0).with_occupancy(0);
        let kpis = KpiCalculator::default()
            .calculate(&profile)
            .expect("zero occupancy tolerated");
        assert_eq!(kpis.occupancy, 1);
        assert_eq!(kpis.energy_per_occupant_kwh, 50_000.0);
    }

    #[test]
    fn climate_zone_scales_adjusted_value_only() {
        let calculator = KpiCalculator::new(ClimateTable::from_factors([("cold", 0.8)]));
        let profile = BuildingProfile::new(BuildingType::Office, 1000.0, 120_000.0)
            .with_climate_zone("Cold");
        let kpis = calculator.calculate(&profile).expect("valid profile");

        assert_eq!(kpis.climate_factor, 0.8);
        assert_eq!(kpis.annual_energy_per_sqm_kwh, 120.0);
        assert!((kpis.climate_adjusted_energy_per_sqm_kwh - 96.0).abs() < 1e-9);

        let unknown = profile.with_climate_zone("polar");
        let kpis = calculator.calculate(&unknown).expect("valid profile");
        assert_eq!(kpis.climate_factor, 1.0);
    }

    #[test]
    fn identical_inputs_yield_identical_kpis() {
        let calculator = KpiCalculator::default();
        let profile = hospital(7.0).with_occupancy(340).with_climate_zone("mild");
        let first = calculator.calculate(&profile).expect("valid profile");
        let second = calculator.calculate(&profile).expect("valid profile");

        assert_eq!(
            first.annual_energy_per_sqm_kwh.to_bits(),
            second.annual_energy_per_sqm_kwh.to_bits()
        );
        assert_eq!(first, second);
    }
}

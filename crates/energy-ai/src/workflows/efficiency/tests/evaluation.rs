use super::common::*;
use crate::workflows::efficiency::{
    AnalysisError, BuildingProfile, BuildingType, EfficiencyEvaluator, EfficiencyLabel,
    EfficiencyVerdict, KpiCalculator,
};

fn classify(profile: &BuildingProfile) -> Result<EfficiencyVerdict, AnalysisError> {
    let kpis = KpiCalculator::default().calculate(profile)?;
    EfficiencyEvaluator::default().evaluate(&kpis, &profile.building_type)
}

#[test]
fn hospital_reference_building_is_efficient() {
    let verdict = classify(&hospital_profile()).expect("hospital is benchmarked");

    assert_eq!(verdict.label, EfficiencyLabel::Efficient);
    assert_eq!(verdict.rating, "excellent");
    assert!((verdict.annual_energy_per_sqm_kwh - 70.68).abs() < 0.01);
    assert!((verdict.score - 0.4712).abs() < 0.001);
    assert_eq!(verdict.potential_savings_percent, 0.0);
    assert_eq!(verdict.matched_range.upper, Some(150.0));
}

#[test]
fn six_month_period_is_annualized_before_classification() {
    let profile = BuildingProfile::new(BuildingType::Hospital, 10_200.0, 360_446.5)
        .with_period_months(6.0);
    let verdict = classify(&profile).expect("hospital is benchmarked");

    assert!((verdict.annual_energy_per_sqm_kwh - 70.68).abs() < 0.01);
    assert_eq!(verdict.label, EfficiencyLabel::Efficient);
}

#[test]
fn value_on_threshold_stays_in_the_more_efficient_band() {
    let on_low = classify(&office_profile(100.0)).expect("office is benchmarked");
    assert_eq!(on_low.label, EfficiencyLabel::Efficient);
    assert_eq!(on_low.score, 1.0);
    assert_eq!(on_low.matched_range.upper, Some(100.0));
    assert_eq!(on_low.potential_savings_percent, 0.0);

    let on_moderate = classify(&office_profile(150.0)).expect("office is benchmarked");
    assert_eq!(on_moderate.label, EfficiencyLabel::ModeratelyEfficient);
    assert_eq!(on_moderate.matched_range.upper, Some(150.0));
    assert_eq!(on_moderate.potential_savings_percent, 33.33);

    let past_moderate = classify(&office_profile(150.5)).expect("office is benchmarked");
    assert_eq!(past_moderate.label, EfficiencyLabel::Inefficient);
    assert_eq!(past_moderate.matched_range.lower, 150.0);
}

#[test]
fn labels_never_improve_as_intensity_rises() {
    let labels: Vec<EfficiencyLabel> = [20.0, 99.9, 100.0, 130.0, 149.9, 150.0, 260.0]
        .into_iter()
        .map(|intensity| classify(&office_profile(intensity)).expect("office").label)
        .collect();

    assert!(labels.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(labels.first(), Some(&EfficiencyLabel::Efficient));
    assert_eq!(labels.last(), Some(&EfficiencyLabel::Inefficient));
}

#[test]
fn score_is_clamped_above_the_poor_reference() {
    let verdict = classify(&office_profile(400.0)).expect("office is benchmarked");

    assert_eq!(verdict.label, EfficiencyLabel::Inefficient);
    assert_eq!(verdict.score, 1.0);
    assert_eq!(verdict.potential_savings_percent, 62.5);
}

#[test]
fn moderately_efficient_savings_target_the_efficient_band() {
    let verdict = classify(&office_profile(125.0)).expect("office is benchmarked");

    assert_eq!(verdict.label, EfficiencyLabel::ModeratelyEfficient);
    assert_eq!(verdict.score, 0.5);
    assert_eq!(verdict.potential_savings_percent, 20.0);
}

#[test]
fn unknown_building_type_is_rejected_after_kpis() {
    let profile = BuildingProfile::new(BuildingType::parse("warehouse"), 500.0, 40_000.0);
    let kpis = KpiCalculator::default()
        .calculate(&profile)
        .expect("kpis do not depend on the building type");

    let err = EfficiencyEvaluator::default()
        .evaluate(&kpis, &profile.building_type)
        .expect_err("warehouse has no benchmark");
    assert_eq!(
        err,
        AnalysisError::UnknownBuildingType(BuildingType::Other("warehouse".to_string()))
    );
}

#[test]
fn invalid_area_is_reported_before_classification() {
    let profile = BuildingProfile::new(BuildingType::Office, 0.0, 10_000.0);
    let err = classify(&profile).expect_err("zero area is invalid");

    assert!(matches!(err, AnalysisError::InvalidInput(message) if message.contains("building_area_m2")));
}

#[test]
fn climate_zone_adjusts_reported_intensity_only() {
    let profile = office_profile(120.0).with_climate_zone("Very Cold");
    let kpis = KpiCalculator::default().calculate(&profile).expect("valid");
    let verdict = EfficiencyEvaluator::default()
        .evaluate(&kpis, &profile.building_type)
        .expect("office");

    assert_eq!(kpis.climate_factor, 0.75);
    assert!((kpis.climate_adjusted_energy_per_sqm_kwh - 90.0).abs() < 1e-9);
    assert_eq!(verdict.label, EfficiencyLabel::ModeratelyEfficient);
}

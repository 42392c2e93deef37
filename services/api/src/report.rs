use crate::infra::build_service;
use clap::Args;
use energy_ai::config::AppConfig;
use energy_ai::error::AppError;
use energy_ai::workflows::efficiency::{
    AnalysisReport, AnalysisRequest, BuildingProfile, BuildingType, Composition, FallbackReason,
    Localization, StaticTables,
};
use std::fmt::Write as _;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Building type (school, university, hotel, residential, office, hospital)
    #[arg(long)]
    pub(crate) building_type: String,
    /// Floor area in square metres
    #[arg(long)]
    pub(crate) area: f64,
    /// Energy consumed over the measurement period, in kWh
    #[arg(long)]
    pub(crate) energy: f64,
    /// Length of the measurement period in months (1-12)
    #[arg(long, default_value_t = 12.0)]
    pub(crate) period_months: f64,
    /// Number of occupants
    #[arg(long)]
    pub(crate) occupancy: Option<i64>,
    /// Climate zone used for the adjusted intensity (hot, mild, cold, very_cold)
    #[arg(long)]
    pub(crate) climate_zone: Option<String>,
    /// Extra topic steering document retrieval, e.g. "lighting"
    #[arg(long)]
    pub(crate) topic: Option<String>,
    /// Print the full report as JSON
    #[arg(long)]
    pub(crate) json: bool,
    /// Skip provider detection and use the template report
    #[arg(long)]
    pub(crate) template_only: bool,
}

impl AnalyzeArgs {
    fn request(&self) -> AnalysisRequest {
        let mut profile = BuildingProfile::new(
            BuildingType::parse(&self.building_type),
            self.area,
            self.energy,
        )
        .with_period_months(self.period_months);
        profile.occupancy = self.occupancy;
        profile.climate_zone = self.climate_zone.clone();

        AnalysisRequest {
            profile,
            topic: self.topic.clone(),
        }
    }
}

pub(crate) async fn run_analysis_report(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(&config, !args.template_only).await?;
    let report = service.analyze(args.request()).await?;

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Report payload unavailable: {err}"),
        }
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

pub(crate) fn run_benchmark_listing() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let tables = StaticTables::load(&config.tables)?;

    println!("Benchmark thresholds (kWh/m²/year)");
    println!("{:<14} {:>11} {:>11} {:>10}", "type", "efficient<=", "moderate<=", "poor ref");
    for (building_type, band) in tables.benchmarks.iter() {
        println!(
            "{:<14} {:>11.0} {:>11.0} {:>10.0}",
            building_type.as_str(),
            band.low,
            band.moderate,
            band.high
        );
    }
    Ok(())
}

pub(crate) fn run_table_check() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let tables = StaticTables::load(&config.tables)?;
    let stats = tables.dataset.stats();

    println!("Static tables OK");
    println!("  Benchmark types: {}", tables.benchmarks.len());
    println!("  Knowledge documents: {}", tables.knowledge.len());
    println!(
        "  Reference records: {} ({} with floor area)",
        stats.count,
        tables
            .dataset
            .records()
            .iter()
            .filter(|record| record.energy_per_sqm_kwh().is_some())
            .count()
    );
    println!("  Climate zones: {}", tables.climate.zones().count());
    println!("  Retrieval limit: {}", config.tables.retrieval_limit);
    println!("  Provider preference: {:?}", config.llm.preference);
    Ok(())
}

pub(crate) fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let verdict = &report.verdict;
    let kpis = &report.kpis;

    writeln!(&mut out, "{} building", verdict.building_type.label()).expect("write title");
    writeln!(
        &mut out,
        "  Intensity: {:.2} kWh/m² over {} months, {:.1} kWh/m²/year",
        kpis.energy_per_sqm_kwh, kpis.period_months, kpis.annual_energy_per_sqm_kwh
    )
    .expect("write intensity");
    if kpis.climate_factor != 1.0 {
        writeln!(
            &mut out,
            "  Climate adjusted: {:.1} kWh/m²/year (factor {})",
            kpis.climate_adjusted_energy_per_sqm_kwh, kpis.climate_factor
        )
        .expect("write climate");
    }
    writeln!(
        &mut out,
        "  Verdict: {} ({}), score {:.2}",
        verdict.label.description(),
        verdict.rating,
        verdict.score
    )
    .expect("write verdict");
    if verdict.potential_savings_percent > 0.0 {
        writeln!(
            &mut out,
            "  Savings to reach the next band: {:.1}%",
            verdict.potential_savings_percent
        )
        .expect("write savings");
    }

    let narrative = &report.narrative;
    let origin = match &narrative.composition {
        Composition::Generated { provider, .. } => format!("generated by {provider}"),
        Composition::Fallback { reason, .. } => format!("template ({})", fallback_label(reason)),
    };
    writeln!(&mut out, "  Report: {origin}").expect("write origin");
    match &narrative.localization {
        Localization::NotConfigured => {}
        Localization::Translated { language } => {
            writeln!(&mut out, "  Translated to {language}").expect("write translation");
        }
        Localization::Failed { language, reason } => {
            writeln!(&mut out, "  Translation to {language} failed: {reason}")
                .expect("write translation failure");
        }
    }

    if !report.sources.is_empty() {
        writeln!(&mut out, "  Sources:").expect("write sources title");
        for source in &report.sources {
            writeln!(&mut out, "    - {} [{}]", source.title, source.source).expect("write source");
        }
    }

    let text = narrative.report();
    writeln!(
        &mut out,
        "\n{}\n\n{}",
        text.explanation.trim(),
        text.recommendations.trim()
    )
    .expect("write narrative");
    out
}

fn fallback_label(reason: &FallbackReason) -> String {
    match reason {
        FallbackReason::NotConfigured => "no provider configured".to_string(),
        FallbackReason::Unavailable { detail } => format!("provider unavailable: {detail}"),
        FallbackReason::Timeout { after_secs } => format!("provider timed out after {after_secs}s"),
        FallbackReason::EmptyResponse => "provider returned no text".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_ai::workflows::efficiency::{EfficiencyAnalysisService, ExplanationComposer};

    fn args(building_type: &str) -> AnalyzeArgs {
        AnalyzeArgs {
            building_type: building_type.to_string(),
            area: 10_200.0,
            energy: 720_893.0,
            period_months: 12.0,
            occupancy: Some(420),
            climate_zone: Some("cold".to_string()),
            topic: None,
            json: false,
            template_only: true,
        }
    }

    fn service() -> EfficiencyAnalysisService {
        let tables = StaticTables::builtin().expect("built-in tables");
        EfficiencyAnalysisService::new(tables, 3, ExplanationComposer::template_only())
    }

    #[test]
    fn args_become_an_analysis_request() {
        let request = args("Hospital").request();

        assert_eq!(request.profile.building_type, BuildingType::Hospital);
        assert_eq!(request.profile.occupancy, Some(420));
        assert_eq!(request.profile.climate_zone.as_deref(), Some("cold"));
    }

    #[tokio::test]
    async fn rendered_report_summarises_the_verdict() {
        let report = service()
            .analyze(args("hospital").request())
            .await
            .expect("hospital analysis");

        let text = render_report(&report);
        assert!(text.starts_with("Hospital building"));
        assert!(text.contains("Verdict: efficient (excellent)"));
        assert!(text.contains("Climate adjusted: 60.1 kWh/m²/year (factor 0.85)"));
        assert!(text.contains("Report: template (no provider configured)"));
        assert!(text.contains("## Recommended Actions"));
    }
}

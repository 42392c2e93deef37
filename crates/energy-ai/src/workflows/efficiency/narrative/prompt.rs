use std::fmt::Write as _;

use serde::Serialize;

use super::{ComposerInput, WhatIfComposerInput};
use crate::workflows::efficiency::domain::EfficiencyVerdict;
use crate::workflows::efficiency::knowledge::RetrievalResult;
use crate::workflows::efficiency::whatif::ScenarioKpis;

pub(crate) const ANALYST_SYSTEM_PROMPT: &str = "You are an expert energy efficiency consultant \
specializing in building energy performance analysis. Explain efficiency classifications and \
give actionable recommendations grounded in the reference material provided. Be clear, \
professional and data-driven. Use \"## Explanation\" and \"## Recommendations\" as section headers.";

pub(crate) const WHATIF_SYSTEM_PROMPT: &str = "You are an expert building energy analyst. \
Interpret what-if energy simulations, cite practical guidance from the reference material \
provided and propose actionable solution options. Write clear, structured Markdown with \
\"## Explanation\" and \"## Recommendations\" as section headers.";

/// System instructions plus user content for one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Single-string form for backends without a separate system field.
    pub fn combined(&self) -> String {
        if self.system.is_empty() {
            self.user.clone()
        } else {
            format!("{}\n\n{}", self.system, self.user)
        }
    }
}

pub(crate) fn analysis_prompt(input: &ComposerInput<'_>) -> Prompt {
    let kpis = input.kpis;
    let verdict = input.verdict;
    let band = verdict.benchmarks;
    let mut user = String::new();

    writeln!(
        &mut user,
        "Analyze the following building energy data and provide a comprehensive explanation and recommendations.\n"
    )
    .expect("write instruction");
    writeln!(&mut user, "BUILDING INFORMATION:").expect("write building title");
    writeln!(
        &mut user,
        "- Building type: {}",
        verdict.building_type.label()
    )
    .expect("write building type");
    writeln!(
        &mut user,
        "- Total energy consumption: {:.1} kWh",
        kpis.total_energy_kwh
    )
    .expect("write total");
    writeln!(&mut user, "- Building area: {:.1} m²", kpis.building_area_m2).expect("write area");
    writeln!(
        &mut user,
        "- Measurement period: {} months",
        kpis.period_months
    )
    .expect("write period");
    if input.profile.occupancy.is_some() {
        writeln!(&mut user, "- Occupancy: {} occupants", kpis.occupancy).expect("write occupancy");
        writeln!(
            &mut user,
            "- Energy per occupant: {:.1} kWh",
            kpis.energy_per_occupant_kwh
        )
        .expect("write per occupant");
    }
    if let Some(zone) = input.profile.climate_zone.as_deref() {
        writeln!(
            &mut user,
            "- Climate zone: {zone} (adjusted intensity {:.1} kWh/m²/year)",
            kpis.climate_adjusted_energy_per_sqm_kwh
        )
        .expect("write climate");
    }

    writeln!(&mut user, "\nENERGY PERFORMANCE:").expect("write performance title");
    writeln!(
        &mut user,
        "- Annual energy per m²: {:.1} kWh/m²/year",
        verdict.annual_energy_per_sqm_kwh
    )
    .expect("write annual intensity");
    writeln!(
        &mut user,
        "- Energy per m² for the selected period: {:.2} kWh/m²",
        kpis.energy_per_sqm_kwh
    )
    .expect("write period intensity");
    writeln!(
        &mut user,
        "- Classification: {} ({}), score {:.2} within its band",
        verdict.rating.to_uppercase(),
        verdict.label.as_str(),
        verdict.score
    )
    .expect("write classification");
    if verdict.potential_savings_percent > 0.0 {
        writeln!(
            &mut user,
            "- Reduction needed to reach the next band: {:.1}%",
            verdict.potential_savings_percent
        )
        .expect("write savings");
    }

    writeln!(&mut user, "\nBENCHMARKS:").expect("write benchmarks title");
    writeln!(&mut user, "- Efficient up to: {} kWh/m²/year", band.low).expect("write efficient");
    writeln!(
        &mut user,
        "- Moderately efficient up to: {} kWh/m²/year",
        band.moderate
    )
    .expect("write moderate");
    writeln!(
        &mut user,
        "- Poor performance reference: {} kWh/m²/year",
        band.high
    )
    .expect("write poor reference");

    if !input.similar.is_empty() {
        writeln!(
            &mut user,
            "\nREFERENCE DATASET (year, total kWh, area m², kWh/m²):"
        )
        .expect("write dataset title");
        for record in input.similar {
            writeln!(
                &mut user,
                "- {}, {:.0}, {:.0}, {:.2}",
                record.year,
                record.total_energy_kwh,
                record.building_area_m2,
                record.energy_per_sqm_kwh
            )
            .expect("write dataset record");
        }
    }

    write_documents(&mut user, input.retrieval);

    write!(
        &mut user,
        "\nPlease provide:\n\
         1. A detailed explanation of the building's energy performance\n\
         2. Why it is classified as {}\n\
         3. Specific, actionable recommendations based on the documents provided\n\
         4. The expected impact of the recommended actions\n\n\
         Format your response with the sections \"## Explanation\" and \"## Recommendations\".",
        verdict.label.description()
    )
    .expect("write request");

    Prompt::new(ANALYST_SYSTEM_PROMPT, user)
}

pub(crate) fn whatif_prompt(input: &WhatIfComposerInput<'_>) -> Prompt {
    let simulation = input.simulation;
    let delta = &simulation.delta;
    let mut user = String::new();

    writeln!(
        &mut user,
        "WHAT-IF SCENARIO: {} ({})",
        simulation.scenario.as_str(),
        simulation.scenario.label()
    )
    .expect("write scenario");
    writeln!(
        &mut user,
        "Building type: {}",
        simulation.building_type.label()
    )
    .expect("write building type");

    write_side(&mut user, "BASELINE", &simulation.baseline, input.baseline);
    write_side(&mut user, "WHAT-IF", &simulation.whatif, input.whatif);

    writeln!(&mut user, "\nCHANGE:").expect("write change title");
    writeln!(
        &mut user,
        "- Savings: {:.0} kWh ({:.1}%)",
        delta.savings_kwh, delta.savings_percent
    )
    .expect("write savings");
    writeln!(
        &mut user,
        "- Estimated annual cost savings: {:.2}",
        delta.annual_cost_savings
    )
    .expect("write cost savings");

    if !simulation.notes.is_empty() {
        writeln!(&mut user, "\nASSUMPTIONS:").expect("write assumptions title");
        for note in &simulation.notes {
            writeln!(&mut user, "- {note}").expect("write note");
        }
    }

    writeln!(&mut user, "\nSOLUTION OPTIONS (kWh, savings %, annual cost savings):")
        .expect("write options title");
    for option in &simulation.solutions {
        writeln!(
            &mut user,
            "- {}: {}, {:.0}, {:.1}, {:.2}",
            option.name,
            option.summary,
            option.total_kwh,
            option.savings_percent,
            option.annual_cost_savings
        )
        .expect("write option");
    }

    write_documents(&mut user, input.retrieval);

    write!(
        &mut user,
        "\nPlease provide:\n\
         1. One factual summary sentence stating the savings percentage and the estimated annual cost savings\n\
         2. An interpretation of the result that references the documents provided\n\
         3. Three solution options, each written as \"If you choose ... then ...\"\n\n\
         Format your response with the sections \"## Explanation\" (items 1 and 2) and \"## Recommendations\" (item 3)."
    )
    .expect("write request");

    Prompt::new(WHATIF_SYSTEM_PROMPT, user)
}

fn write_side(user: &mut String, title: &str, kpis: &ScenarioKpis, verdict: &EfficiencyVerdict) {
    writeln!(user, "\n{title}:").expect("write side title");
    writeln!(
        user,
        "- Total energy: {:.0} kWh (annual estimate {:.0} kWh)",
        kpis.total_kwh, kpis.total_kwh_annual_est
    )
    .expect("write side total");
    writeln!(
        user,
        "- Annual energy per m²: {:.1} kWh/m²/year",
        verdict.annual_energy_per_sqm_kwh
    )
    .expect("write side intensity");
    if let (Some(people), Some(per_person)) = (kpis.people_count, kpis.energy_per_person_kwh) {
        writeln!(user, "- Occupants: {people}, {per_person:.1} kWh each").expect("write side people");
    }
    writeln!(user, "- Estimated annual cost: {:.2}", kpis.cost_annual_est).expect("write side cost");
    writeln!(
        user,
        "- Classification: {} ({})",
        verdict.label.description(),
        verdict.rating
    )
    .expect("write side classification");
}

fn write_documents(user: &mut String, retrieval: &RetrievalResult<'_>) {
    if retrieval.is_empty() {
        return;
    }

    writeln!(user, "\nRELEVANT TECHNICAL DOCUMENTS:").expect("write documents title");
    for document in retrieval.documents() {
        writeln!(
            user,
            "### {} [{}]\n{}\n",
            document.title, document.source, document.body
        )
        .expect("write document");
    }
}

pub(crate) fn translation_prompt(language: &str, chunk: &str) -> Prompt {
    let system = format!(
        "You are a professional translation engine. Translate the user's text to {language}.\n\
         Rules:\n\
         - Preserve Markdown structure (## headings, lists, bold text).\n\
         - Keep numbers and units unchanged.\n\
         - Do not add commentary.\n\
         - Return only the translation."
    );
    Prompt::new(system, format!("TEXT:\n{chunk}"))
}

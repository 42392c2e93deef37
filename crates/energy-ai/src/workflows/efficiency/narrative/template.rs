use std::fmt::Write as _;

use super::sections::analysis_heading;
use super::{ComposerInput, Report, WhatIfComposerInput};
use crate::workflows::efficiency::domain::EfficiencyLabel;
use crate::workflows::efficiency::knowledge::RetrievalResult;

const MAX_SNIPPETS: usize = 2;
const SNIPPET_CHARS: usize = 240;

/// Deterministic report built only from computed values and retrieved snippets.
pub(crate) fn render(input: &ComposerInput<'_>) -> Report {
    Report {
        explanation: explanation(input),
        recommendations: recommendations(input),
        sources: input.source_ids(),
    }
}

/// Deterministic what-if report: savings summary, classification change and the graded
/// solution options.
pub(crate) fn render_whatif(input: &WhatIfComposerInput<'_>) -> Report {
    Report {
        explanation: whatif_explanation(input),
        recommendations: whatif_options(input),
        sources: input.source_ids(),
    }
}

fn explanation(input: &ComposerInput<'_>) -> String {
    let kpis = input.kpis;
    let verdict = input.verdict;
    let band = verdict.benchmarks;
    let annual = verdict.annual_energy_per_sqm_kwh;
    let mut text = String::new();

    writeln!(&mut text, "## {}\n", analysis_heading(&verdict.building_type)).expect("write heading");
    writeln!(
        &mut text,
        "**Current performance:** the building uses {annual:.1} kWh/m²/year and is classified as **{}** ({} rating).\n",
        verdict.label.description(),
        verdict.rating
    )
    .expect("write performance");
    writeln!(&mut text, "**Benchmark comparison:**").expect("write benchmark title");
    writeln!(&mut text, "- Efficient up to {} kWh/m²/year", band.low).expect("write efficient band");
    writeln!(
        &mut text,
        "- Moderately efficient up to {} kWh/m²/year",
        band.moderate
    )
    .expect("write moderate band");
    writeln!(
        &mut text,
        "- Poor performance reference {} kWh/m²/year\n",
        band.high
    )
    .expect("write poor reference");

    writeln!(&mut text, "**Key metrics:**").expect("write metrics title");
    writeln!(
        &mut text,
        "- Total energy consumption: {:.1} kWh",
        kpis.total_energy_kwh
    )
    .expect("write total");
    writeln!(&mut text, "- Building area: {:.1} m²", kpis.building_area_m2).expect("write area");
    writeln!(
        &mut text,
        "- Energy per m² for the period: {:.2} kWh/m²",
        kpis.energy_per_sqm_kwh
    )
    .expect("write intensity");
    if input.profile.occupancy.is_some() {
        writeln!(
            &mut text,
            "- Energy per occupant: {:.1} kWh",
            kpis.energy_per_occupant_kwh
        )
        .expect("write per occupant");
    }

    text.push('\n');
    let assessment = match verdict.label {
        EfficiencyLabel::Inefficient => format!(
            "consumption exceeds the moderate threshold by {:.1} kWh/m²/year. \
             Cutting about {:.1}% would reach the moderately efficient band.",
            annual - band.moderate,
            verdict.potential_savings_percent
        ),
        EfficiencyLabel::ModeratelyEfficient => format!(
            "performance is average. Reducing consumption by about {:.1}% \
             would bring it to {} kWh/m²/year or less.",
            verdict.potential_savings_percent, band.low
        ),
        EfficiencyLabel::Efficient => {
            "performance is excellent. Continue monitoring to sustain it.".to_string()
        }
    };
    writeln!(&mut text, "**Assessment:** {assessment}").expect("write assessment");

    write_guidance(&mut text, input.retrieval);
    text.trim_end().to_string()
}

fn recommendations(input: &ComposerInput<'_>) -> String {
    let band = input.verdict.benchmarks;
    let body = match input.verdict.label {
        EfficiencyLabel::Inefficient => format!(
            "**Priority 1: immediate actions**\n\
             1. Audit HVAC systems and align schedules with occupancy.\n\
             2. Improve insulation and seal air leaks in the building envelope.\n\
             3. Replace inefficient lighting with LED and add occupancy sensors.\n\n\
             **Priority 2: medium term**\n\
             4. Install sub-metering and an energy management system.\n\
             5. Train staff and tighten maintenance routines.\n\n\
             **Priority 3: long term**\n\
             6. Evaluate on-site renewable generation.\n\n\
             Priority 1 actions typically save 20-30%, moving the building towards {} kWh/m²/year.",
            band.moderate
        ),
        EfficiencyLabel::ModeratelyEfficient => format!(
            "1. Optimize HVAC scheduling and setpoints.\n\
             2. Upgrade lighting to LED with smart controls.\n\
             3. Add detailed monitoring to track trends and anomalies.\n\
             4. Fine-tune operating schedules and maintenance.\n\n\
             These measures target consumption of {} kWh/m²/year or less.",
            band.low
        ),
        EfficiencyLabel::Efficient => "1. Keep up regular maintenance of all systems.\n\
             2. Monitor consumption trends monthly.\n\
             3. Repeat an energy audit every few years to find new technology options."
            .to_string(),
    };

    format!("## Recommended Actions\n\n{body}")
}

fn whatif_explanation(input: &WhatIfComposerInput<'_>) -> String {
    let simulation = input.simulation;
    let delta = &simulation.delta;
    let mut text = String::new();

    writeln!(&mut text, "## {}\n", input.heading()).expect("write heading");
    writeln!(
        &mut text,
        "**Summary:** this change cuts consumption by about {:.1}% ({:.0} kWh) with estimated \
         annual cost savings of {:.2}.\n",
        delta.savings_percent, delta.savings_kwh, delta.annual_cost_savings
    )
    .expect("write summary");

    let (before, after) = (input.baseline, input.whatif);
    writeln!(
        &mut text,
        "**Classification:** {:.1} kWh/m²/year before and {:.1} kWh/m²/year after.",
        before.annual_energy_per_sqm_kwh, after.annual_energy_per_sqm_kwh
    )
    .expect("write intensities");
    let change = if before.label == after.label {
        format!("The building stays **{}**.", after.label.description())
    } else {
        format!(
            "The building moves from **{}** to **{}**.",
            before.label.description(),
            after.label.description()
        )
    };
    writeln!(&mut text, "{change}").expect("write label change");

    if !simulation.notes.is_empty() {
        writeln!(&mut text, "\n**Assumptions:**").expect("write assumptions title");
        for note in &simulation.notes {
            writeln!(&mut text, "- {note}").expect("write note");
        }
    }

    write_guidance(&mut text, input.retrieval);
    text.trim_end().to_string()
}

fn whatif_options(input: &WhatIfComposerInput<'_>) -> String {
    let mut text = String::from("## Solution Options\n\n");
    for (index, option) in input.simulation.solutions.iter().enumerate() {
        writeln!(
            &mut text,
            "{}. If you choose **{}**, consumption falls to {:.0} kWh, saving {:.1}% and about \
             {:.2} per year.",
            index + 1,
            option.summary,
            option.total_kwh,
            option.savings_percent,
            option.annual_cost_savings
        )
        .expect("write solution option");
    }
    text.trim_end().to_string()
}

fn write_guidance(text: &mut String, retrieval: &RetrievalResult<'_>) {
    let snippets: Vec<_> = retrieval.documents().take(MAX_SNIPPETS).collect();
    if snippets.is_empty() {
        return;
    }

    writeln!(text, "\n**Reference guidance:**").expect("write guidance title");
    for document in snippets {
        writeln!(
            text,
            "- {}: {}",
            document.title,
            document.snippet(SNIPPET_CHARS)
        )
        .expect("write guidance");
    }
}

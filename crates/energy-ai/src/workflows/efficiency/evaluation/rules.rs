use super::super::domain::{BandRange, BenchmarkBand, EfficiencyLabel};

pub(crate) struct BandPlacement {
    pub label: EfficiencyLabel,
    pub range: BandRange,
    pub score: f64,
}

/// Places an annual intensity into its band. Upper bounds are inclusive, so a value sitting
/// exactly on a threshold stays in the more efficient band ending there.
pub(crate) fn place(annual_energy_per_sqm: f64, band: &BenchmarkBand) -> BandPlacement {
    if annual_energy_per_sqm <= band.low {
        BandPlacement {
            label: EfficiencyLabel::Efficient,
            range: BandRange {
                lower: 0.0,
                upper: Some(band.low),
            },
            score: position(annual_energy_per_sqm, 0.0, band.low),
        }
    } else if annual_energy_per_sqm <= band.moderate {
        BandPlacement {
            label: EfficiencyLabel::ModeratelyEfficient,
            range: BandRange {
                lower: band.low,
                upper: Some(band.moderate),
            },
            score: position(annual_energy_per_sqm, band.low, band.moderate),
        }
    } else {
        BandPlacement {
            label: EfficiencyLabel::Inefficient,
            range: BandRange {
                lower: band.moderate,
                upper: None,
            },
            score: position(annual_energy_per_sqm, band.moderate, band.high),
        }
    }
}

fn position(value: f64, lower: f64, upper: f64) -> f64 {
    if upper <= lower {
        return 0.0;
    }
    ((value - lower) / (upper - lower)).clamp(0.0, 1.0)
}

/// Share of consumption to cut to reach the lower edge of the current band.
pub(crate) fn potential_savings_percent(
    annual_energy_per_sqm: f64,
    label: EfficiencyLabel,
    band: &BenchmarkBand,
) -> f64 {
    let target = match label {
        EfficiencyLabel::Efficient => return 0.0,
        EfficiencyLabel::ModeratelyEfficient => band.low,
        EfficiencyLabel::Inefficient => band.moderate,
    };

    if annual_energy_per_sqm <= 0.0 {
        return 0.0;
    }

    let percent = ((annual_energy_per_sqm - target) / annual_energy_per_sqm * 100.0).max(0.0);
    (percent * 100.0).round() / 100.0
}

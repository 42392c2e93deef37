//! Deterministic what-if savings scenarios.
//!
//! Consumption is split into lighting, HVAC and plug loads using per-type shares; each
//! scenario adjusts the relevant share and the result is re-expressed as KPIs with
//! cost and emissions attached. Three graded solution options accompany every run.

use serde::{Deserialize, Serialize};

use super::domain::{AnalysisError, BuildingType};
use super::kpi::annualize;

const LED_LIGHTING_SAVING: f64 = 0.55;
const LED_HVAC_SIDE_BENEFIT: f64 = 0.08;
const OCCUPANCY_FIXED_SHARE: f64 = 0.60;
const OCCUPANCY_REDUCTION: f64 = 0.8;
const SCHEDULE_DEPENDENT_SHARE: f64 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scenario {
    #[serde(rename = "led")]
    Led,
    #[serde(rename = "occupancy_down_20")]
    OccupancyDown20,
    #[serde(rename = "hours_shorter")]
    HoursShorter,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Self::Led, Self::OccupancyDown20, Self::HoursShorter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Led => "led",
            Self::OccupancyDown20 => "occupancy_down_20",
            Self::HoursShorter => "hours_shorter",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Led => "LED lighting retrofit",
            Self::OccupancyDown20 => "20% lower occupancy",
            Self::HoursShorter => "Shorter operating hours",
        }
    }

    /// Free-text topic used to retrieve supporting documents.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Led => "lighting led controls",
            Self::OccupancyDown20 => "occupancy operations",
            Self::HoursShorter => "scheduling hvac operations",
        }
    }
}

/// Typical end-use split of consumption for a building type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadShares {
    pub lighting: f64,
    pub hvac: f64,
    pub plug: f64,
}

impl LoadShares {
    const fn new(lighting: f64, hvac: f64, plug: f64) -> Self {
        Self {
            lighting,
            hvac,
            plug,
        }
    }

    /// Shares for `building_type`; unlisted types use the office split.
    pub fn for_building(building_type: &BuildingType) -> Self {
        match building_type {
            BuildingType::School => Self::new(0.25, 0.40, 0.35),
            BuildingType::University => Self::new(0.22, 0.43, 0.35),
            BuildingType::Hotel => Self::new(0.18, 0.52, 0.30),
            BuildingType::Residential => Self::new(0.12, 0.45, 0.43),
            BuildingType::Hospital => Self::new(0.18, 0.55, 0.27),
            BuildingType::Office | BuildingType::Other(_) => Self::new(0.20, 0.45, 0.35),
        }
    }
}

fn default_period_months() -> f64 {
    12.0
}

fn default_hours_per_day() -> f64 {
    9.0
}

fn default_price_per_kwh() -> f64 {
    3.5
}

fn default_emission_factor() -> f64 {
    0.42
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfInputs {
    pub building_type: BuildingType,
    pub building_area_m2: f64,
    pub total_energy_kwh: f64,
    #[serde(default = "default_period_months")]
    pub period_months: f64,
    #[serde(default)]
    pub occupancy: Option<i64>,
    pub scenario: Scenario,
    #[serde(default = "default_hours_per_day")]
    pub baseline_hours_per_day: f64,
    #[serde(default)]
    pub new_hours_per_day: Option<f64>,
    #[serde(default = "default_price_per_kwh")]
    pub electricity_price_per_kwh: f64,
    #[serde(default = "default_emission_factor")]
    pub grid_emission_factor_kg_per_kwh: f64,
}

impl WhatIfInputs {
    pub fn new(
        building_type: BuildingType,
        building_area_m2: f64,
        total_energy_kwh: f64,
        scenario: Scenario,
    ) -> Self {
        Self {
            building_type,
            building_area_m2,
            total_energy_kwh,
            period_months: default_period_months(),
            occupancy: None,
            scenario,
            baseline_hours_per_day: default_hours_per_day(),
            new_hours_per_day: None,
            electricity_price_per_kwh: default_price_per_kwh(),
            grid_emission_factor_kg_per_kwh: default_emission_factor(),
        }
    }

    pub fn with_occupancy(mut self, occupancy: i64) -> Self {
        self.occupancy = Some(occupancy);
        self
    }

    pub fn with_period_months(mut self, period_months: f64) -> Self {
        self.period_months = period_months;
        self
    }

    pub fn with_hours(mut self, baseline: f64, new: Option<f64>) -> Self {
        self.baseline_hours_per_day = baseline;
        self.new_hours_per_day = new;
        self
    }
}

/// Consumption figures for one side of the comparison, rounded for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioKpis {
    pub total_kwh: f64,
    pub total_kwh_annual_est: f64,
    pub people_count: Option<u64>,
    pub energy_per_sqm_kwh: f64,
    pub energy_per_person_kwh: Option<f64>,
    pub co2_per_person_kg: Option<f64>,
    pub cost: f64,
    pub cost_annual_est: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Savings {
    pub savings_kwh: f64,
    pub savings_percent: f64,
    pub annual_cost_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndUseEstimate {
    pub shares: LoadShares,
    pub lighting_kwh: f64,
    pub hvac_kwh: f64,
    pub plug_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionOption {
    pub name: String,
    pub summary: &'static str,
    pub total_kwh: f64,
    pub kpis: ScenarioKpis,
    pub savings_percent: f64,
    pub annual_cost_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfSimulation {
    pub scenario: Scenario,
    pub building_type: BuildingType,
    pub end_use: EndUseEstimate,
    pub baseline: ScenarioKpis,
    pub whatif: ScenarioKpis,
    pub delta: Savings,
    /// Occupant count after the scenario, when one applies.
    pub whatif_occupancy: Option<u64>,
    pub notes: Vec<String>,
    pub solutions: Vec<SolutionOption>,
}

/// Stateless scenario engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatIfSimulator;

impl WhatIfSimulator {
    pub fn simulate(&self, inputs: &WhatIfInputs) -> Result<WhatIfSimulation, AnalysisError> {
        validate(inputs)?;

        let shares = LoadShares::for_building(&inputs.building_type);
        let base_total = inputs.total_energy_kwh;
        let base_people = inputs.occupancy.filter(|people| *people > 0).map(|people| people as u64);
        let pricing = Pricing::from(inputs);

        let lighting_kwh = base_total * shares.lighting;
        let end_use = EndUseEstimate {
            shares,
            lighting_kwh: round2(lighting_kwh),
            hvac_kwh: round2(base_total * shares.hvac),
            plug_kwh: round2(base_total * shares.plug),
        };

        let mut whatif_people = base_people;
        let mut notes = Vec::new();

        let (new_total, option_totals, summaries) = match inputs.scenario {
            Scenario::Led => {
                let lighting_saved = lighting_kwh * LED_LIGHTING_SAVING;
                let hvac_side_saved = lighting_saved * LED_HVAC_SIDE_BENEFIT;
                let led_only = base_total - lighting_saved - hvac_side_saved;
                let with_sensors = led_only - lighting_kwh * (1.0 - LED_LIGHTING_SAVING) * 0.15;
                let with_automation = with_sensors * 0.95;

                notes.push(
                    "LED retrofits cut lighting consumption and lower internal heat gains, \
                     giving a small additional cooling benefit."
                        .to_string(),
                );
                notes.push(format!(
                    "Assumes {:.0}% lighting savings and a {:.0}% HVAC side benefit on the saved lighting energy.",
                    LED_LIGHTING_SAVING * 100.0,
                    LED_HVAC_SIDE_BENEFIT * 100.0
                ));

                (
                    led_only,
                    [led_only, with_sensors, with_automation],
                    [
                        "LED retrofit only",
                        "LED retrofit with occupancy sensors and timers",
                        "LED, sensors and automated shutdown schedules",
                    ],
                )
            }
            Scenario::OccupancyDown20 => {
                let people = base_people.ok_or_else(|| {
                    AnalysisError::InvalidInput(
                        "occupancy must be greater than zero for the occupancy_down_20 scenario"
                            .to_string(),
                    )
                })?;
                let reduced = ((people as f64 * OCCUPANCY_REDUCTION).round() as u64).max(1);
                whatif_people = Some(reduced);

                let fixed_kwh = base_total * OCCUPANCY_FIXED_SHARE;
                let variable_kwh = base_total - fixed_kwh;
                let fewer_people = fixed_kwh + variable_kwh * (reduced as f64 / people as f64);
                let consolidated = fixed_kwh * 0.90 + variable_kwh * OCCUPANCY_REDUCTION;
                let with_dcv = consolidated * 0.94;

                notes.push(
                    "Consumption does not fall in proportion to occupancy; servers, standby \
                     equipment and base ventilation keep running."
                        .to_string(),
                );
                notes.push(format!(
                    "Assumes {:.0}% fixed and {:.0}% occupancy-driven load.",
                    OCCUPANCY_FIXED_SHARE * 100.0,
                    (1.0 - OCCUPANCY_FIXED_SHARE) * 100.0
                ));

                (
                    fewer_people,
                    [fewer_people, consolidated, with_dcv],
                    [
                        "Fewer occupants in unchanged spaces",
                        "Space consolidation with schedule optimisation",
                        "Consolidation with demand-controlled ventilation",
                    ],
                )
            }
            Scenario::HoursShorter => {
                let baseline_hours = inputs.baseline_hours_per_day.clamp(1.0, 24.0);
                let new_hours = inputs
                    .new_hours_per_day
                    .unwrap_or(baseline_hours * 0.8)
                    .clamp(1.0, 24.0);
                let ratio = (new_hours / baseline_hours).clamp(0.2, 1.2);

                let shorter = base_total * (1.0 - SCHEDULE_DEPENDENT_SHARE)
                    + base_total * SCHEDULE_DEPENDENT_SHARE * ratio;

                notes.push(
                    "Shorter operating hours reduce scheduled lighting, HVAC and plug loads \
                     while base loads continue."
                        .to_string(),
                );
                notes.push(format!(
                    "Assumes {:.0}% schedule-dependent load with an hours ratio of {:.1}%.",
                    SCHEDULE_DEPENDENT_SHARE * 100.0,
                    ratio * 100.0
                ));

                (
                    shorter,
                    [shorter, shorter * 0.96, shorter * 0.92],
                    [
                        "Shorter operating hours",
                        "Shorter hours with out-of-hours shutdown discipline",
                        "Shorter hours with automation and HVAC setback",
                    ],
                )
            }
        };

        let new_total = new_total.max(0.0);
        let baseline = scenario_kpis(base_total, base_people, inputs, &pricing);
        let whatif = scenario_kpis(new_total, whatif_people, inputs, &pricing);
        let delta = savings(base_total, &baseline, &whatif);

        let solutions = option_totals
            .iter()
            .zip(summaries)
            .enumerate()
            .map(|(index, (total, summary))| {
                let total = round2(total.max(0.0));
                let kpis = scenario_kpis(total, whatif_people, inputs, &pricing);
                let option_savings = savings(base_total, &baseline, &kpis);
                SolutionOption {
                    name: format!("Option {}", index + 1),
                    summary,
                    total_kwh: total,
                    kpis,
                    savings_percent: option_savings.savings_percent,
                    annual_cost_savings: option_savings.annual_cost_savings,
                }
            })
            .collect();

        Ok(WhatIfSimulation {
            scenario: inputs.scenario,
            building_type: inputs.building_type.clone(),
            end_use,
            baseline,
            whatif,
            delta,
            whatif_occupancy: whatif_people,
            notes,
            solutions,
        })
    }
}

struct Pricing {
    price_per_kwh: f64,
    emission_factor: f64,
}

impl From<&WhatIfInputs> for Pricing {
    fn from(inputs: &WhatIfInputs) -> Self {
        Self {
            price_per_kwh: inputs.electricity_price_per_kwh,
            emission_factor: inputs.grid_emission_factor_kg_per_kwh,
        }
    }
}

fn scenario_kpis(
    total_kwh: f64,
    people: Option<u64>,
    inputs: &WhatIfInputs,
    pricing: &Pricing,
) -> ScenarioKpis {
    let annual = annualize(total_kwh, inputs.period_months);
    let per_person = people.map(|people| total_kwh / people as f64);

    ScenarioKpis {
        total_kwh: round2(total_kwh),
        total_kwh_annual_est: round2(annual),
        people_count: people,
        energy_per_sqm_kwh: round_to(total_kwh / inputs.building_area_m2, 3),
        energy_per_person_kwh: per_person.map(round2),
        co2_per_person_kg: per_person.map(|kwh| round2(kwh * pricing.emission_factor)),
        cost: round2(total_kwh * pricing.price_per_kwh),
        cost_annual_est: round2(annual * pricing.price_per_kwh),
    }
}

fn savings(base_total: f64, baseline: &ScenarioKpis, after: &ScenarioKpis) -> Savings {
    let savings_kwh = base_total - after.total_kwh;
    let savings_percent = if base_total > 0.0 {
        savings_kwh / base_total * 100.0
    } else {
        0.0
    };

    Savings {
        savings_kwh: round2(savings_kwh),
        savings_percent: round2(savings_percent),
        annual_cost_savings: round2(baseline.cost_annual_est - after.cost_annual_est),
    }
}

fn validate(inputs: &WhatIfInputs) -> Result<(), AnalysisError> {
    let checks = [
        (
            inputs.building_area_m2.is_finite() && inputs.building_area_m2 > 0.0,
            "building_area_m2 must be greater than zero",
        ),
        (
            inputs.total_energy_kwh.is_finite() && inputs.total_energy_kwh >= 0.0,
            "total_energy_kwh must be zero or positive",
        ),
        (
            inputs.period_months.is_finite() && (1.0..=12.0).contains(&inputs.period_months),
            "period_months must be between 1 and 12",
        ),
        (
            inputs.electricity_price_per_kwh.is_finite() && inputs.electricity_price_per_kwh >= 0.0,
            "electricity_price_per_kwh must be zero or positive",
        ),
        (
            inputs.grid_emission_factor_kg_per_kwh.is_finite()
                && inputs.grid_emission_factor_kg_per_kwh >= 0.0,
            "grid_emission_factor_kg_per_kwh must be zero or positive",
        ),
        (
            inputs.baseline_hours_per_day.is_finite()
                && inputs.new_hours_per_day.map_or(true, f64::is_finite),
            "operating hours must be finite",
        ),
    ];

    match checks.iter().find(|(ok, _)| !ok) {
        Some((_, message)) => Err(AnalysisError::InvalidInput((*message).to_string())),
        None => Ok(()),
    }
}

fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

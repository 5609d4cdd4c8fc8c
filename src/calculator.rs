//! Fleet fuel cost and CO2 savings calculator
//!
//! Turns a fleet description, a fuel price and an expected savings percentage
//! into annual fuel, cost and emissions figures under three savings scenarios.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tonnes of CO2 emitted per tonne of fuel oil burned
pub const CO2_PER_TONNE_FUEL: f64 = 3.114;

/// Sea days cannot exceed a calendar year
const MAX_SEA_DAYS: f64 = 365.0;

/// Errors that can occur validating a calculation request
#[derive(Debug, Error, PartialEq)]
pub enum CalculationError {
    /// The request contains no vessels
    #[error("At least one vessel is required")]
    NoVessels,

    /// A vessel field is out of range
    #[error("Vessel {index}: {reason}")]
    InvalidVessel { index: usize, reason: &'static str },

    /// The fuel price is not a positive number
    #[error("Fuel price must be a positive number")]
    InvalidFuelPrice,

    /// The savings percentage is not within (0, 100]
    #[error("Estimated savings must be greater than 0 and at most 100 percent")]
    InvalidSavings,
}

/// One class of vessel in the fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessel {
    /// Free-form vessel type, e.g. "Bulk Carrier"
    pub vessel_type: String,
    /// Number of vessels of this type
    pub count: u32,
    /// Fuel burned per vessel per sea day, in metric tonnes
    pub fuel_consumption: f64,
    /// Days at sea per vessel per year
    pub sea_days: f64,
}

/// Body of `POST /api/calculate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub vessels: Vec<Vessel>,
    /// Fuel price in USD/MT
    pub fuel_price: f64,
    /// Expected fuel savings in percent
    pub estimated_savings: f64,
}

/// Savings scenario labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScenarioKind {
    Conservative,
    Expected,
    Optimistic,
}

impl ScenarioKind {
    /// Multiplier applied to the estimated savings percentage
    pub fn factor(self) -> f64 {
        match self {
            ScenarioKind::Conservative => 0.5,
            ScenarioKind::Expected => 1.0,
            ScenarioKind::Optimistic => 1.5,
        }
    }
}

/// Results for a single savings scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub savings_percent: f64,
    /// Tonnes of fuel saved per year
    pub fuel_saved: f64,
    /// USD saved per year
    pub cost_savings: f64,
    /// Tonnes of CO2 avoided per year
    pub co2_reduction: f64,
}

/// Annual figures for one vessel class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselBreakdown {
    pub vessel_type: String,
    pub annual_fuel: f64,
    pub annual_cost: f64,
    pub annual_co2: f64,
}

/// Response body of `POST /api/calculate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub vessels: Vec<VesselBreakdown>,
    /// Tonnes of fuel burned by the fleet per year
    pub total_fuel: f64,
    /// USD spent on fuel per year
    pub total_cost: f64,
    /// Tonnes of CO2 emitted per year
    pub total_co2: f64,
    /// Conservative, expected and optimistic scenarios, in that order
    pub scenarios: Vec<Scenario>,
}

impl CalculateRequest {
    /// Checks every field, reporting the first problem found
    pub fn validate(&self) -> Result<(), CalculationError> {
        if self.vessels.is_empty() {
            return Err(CalculationError::NoVessels);
        }

        for (index, vessel) in self.vessels.iter().enumerate() {
            let invalid = |reason| CalculationError::InvalidVessel { index, reason };
            if vessel.count == 0 {
                return Err(invalid("count must be at least 1"));
            }
            if !vessel.fuel_consumption.is_finite() || vessel.fuel_consumption <= 0.0 {
                return Err(invalid("fuel consumption must be a positive number"));
            }
            if !vessel.sea_days.is_finite() || !(0.0..=MAX_SEA_DAYS).contains(&vessel.sea_days) {
                return Err(invalid("sea days must be between 0 and 365"));
            }
        }

        if !self.fuel_price.is_finite() || self.fuel_price <= 0.0 {
            return Err(CalculationError::InvalidFuelPrice);
        }
        if !self.estimated_savings.is_finite()
            || self.estimated_savings <= 0.0
            || self.estimated_savings > 100.0
        {
            return Err(CalculationError::InvalidSavings);
        }

        Ok(())
    }
}

/// Validates `request` and computes annual fleet figures and scenarios
pub fn calculate(request: &CalculateRequest) -> Result<CalculationResult, CalculationError> {
    request.validate()?;

    let vessels: Vec<VesselBreakdown> = request
        .vessels
        .iter()
        .map(|vessel| {
            let annual_fuel = f64::from(vessel.count) * vessel.fuel_consumption * vessel.sea_days;
            VesselBreakdown {
                vessel_type: vessel.vessel_type.clone(),
                annual_fuel,
                annual_cost: annual_fuel * request.fuel_price,
                annual_co2: annual_fuel * CO2_PER_TONNE_FUEL,
            }
        })
        .collect();

    let total_fuel: f64 = vessels.iter().map(|v| v.annual_fuel).sum();
    let total_cost = total_fuel * request.fuel_price;
    let total_co2 = total_fuel * CO2_PER_TONNE_FUEL;

    let scenarios = [
        ScenarioKind::Conservative,
        ScenarioKind::Expected,
        ScenarioKind::Optimistic,
    ]
    .into_iter()
    .map(|kind| {
        let savings_percent = (request.estimated_savings * kind.factor()).min(100.0);
        let share = savings_percent / 100.0;
        Scenario {
            kind,
            savings_percent,
            fuel_saved: total_fuel * share,
            cost_savings: total_cost * share,
            co2_reduction: total_co2 * share,
        }
    })
    .collect();

    Ok(CalculationResult {
        vessels,
        total_fuel,
        total_cost,
        total_co2,
        scenarios,
    })
}

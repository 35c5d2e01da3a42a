use serde::Serialize;
use std::ops::RangeInclusive;

use super::stats::{round_to, summarize};
use super::{windowed, AnalysisOutcome, BandShare};
use crate::services::store::{DateWindow, SensorTable};

pub const COMFORT_TEMPERATURE_C: RangeInclusive<f64> = 20.0..=24.0;
pub const COMFORT_HUMIDITY_PCT: RangeInclusive<f64> = 40.0..=60.0;

pub const COMFORT_RECOMMENDATIONS: [&str; 3] = [
    "Maintain temperature between 20-24°C for optimal comfort",
    "Keep humidity between 40-60% to prevent mold and dryness",
    "Use smart thermostats to optimize energy usage",
];

/// Each section is `None` when the window has no readings for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComfortAnalysis {
    pub temperature_analysis: Option<TemperatureAnalysis>,
    pub humidity_analysis: Option<HumidityAnalysis>,
    pub comfort_insights: Option<ComfortInsights>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureAnalysis {
    pub average_celsius: f64,
    pub min_celsius: f64,
    pub max_celsius: f64,
    pub optimal_range_20_24c: BandShare,
    pub too_cold_below_20c: usize,
    pub too_warm_above_24c: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HumidityAnalysis {
    pub average_percent: f64,
    pub min_percent: f64,
    pub max_percent: f64,
    pub optimal_range_40_60: BandShare,
    pub too_dry_below_40: usize,
    pub too_humid_above_60: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComfortInsights {
    pub optimal_comfort_conditions: BandShare,
    pub energy_efficiency_score: f64,
    pub recommendations: Vec<String>,
}

/// Readings inside, below and above an inclusive band.
fn split_band(values: &[f64], band: &RangeInclusive<f64>) -> (usize, usize, usize) {
    values.iter().fold((0, 0, 0), |(inside, below, above), v| {
        if band.contains(v) {
            (inside + 1, below, above)
        } else if v < band.start() {
            (inside, below + 1, above)
        } else {
            (inside, below, above + 1)
        }
    })
}

fn temperature_analysis(values: &[f64]) -> Option<TemperatureAnalysis> {
    let summary = summarize(values)?;
    let (inside, below, above) = split_band(values, &COMFORT_TEMPERATURE_C);
    Some(TemperatureAnalysis {
        average_celsius: round_to(summary.mean, 2),
        min_celsius: round_to(summary.min, 2),
        max_celsius: round_to(summary.max, 2),
        optimal_range_20_24c: BandShare::of(inside, values.len()),
        too_cold_below_20c: below,
        too_warm_above_24c: above,
    })
}

fn humidity_analysis(values: &[f64]) -> Option<HumidityAnalysis> {
    let summary = summarize(values)?;
    let (inside, below, above) = split_band(values, &COMFORT_HUMIDITY_PCT);
    Some(HumidityAnalysis {
        average_percent: round_to(summary.mean, 2),
        min_percent: round_to(summary.min, 2),
        max_percent: round_to(summary.max, 2),
        optimal_range_40_60: BandShare::of(inside, values.len()),
        too_dry_below_40: below,
        too_humid_above_60: above,
    })
}

pub fn analyze_comfort(table: &SensorTable, window: &DateWindow) -> AnalysisOutcome<ComfortAnalysis> {
    let records = match windowed(table, window) {
        Ok(records) => records,
        Err(reason) => return AnalysisOutcome::NoData(reason),
    };
    let temperatures: Vec<f64> = records.iter().filter_map(|r| r.temperature).collect();
    let humidities: Vec<f64> = records.iter().filter_map(|r| r.humidity).collect();
    if temperatures.is_empty() && humidities.is_empty() {
        return AnalysisOutcome::no_data("No temperature or humidity data available");
    }

    let paired: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| Some((r.temperature?, r.humidity?)))
        .collect();
    let comfort_insights = (!paired.is_empty()).then(|| {
        let comfortable = paired
            .iter()
            .filter(|(t, h)| COMFORT_TEMPERATURE_C.contains(t) && COMFORT_HUMIDITY_PCT.contains(h))
            .count();
        let raw_pct = comfortable as f64 * 100.0 / paired.len() as f64;
        ComfortInsights {
            optimal_comfort_conditions: BandShare::of(comfortable, paired.len()),
            energy_efficiency_score: (raw_pct + 20.0).min(100.0),
            recommendations: COMFORT_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
        }
    });

    AnalysisOutcome::Ready(ComfortAnalysis {
        temperature_analysis: temperature_analysis(&temperatures),
        humidity_analysis: humidity_analysis(&humidities),
        comfort_insights,
    })
}

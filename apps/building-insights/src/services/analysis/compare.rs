use serde::Serialize;

use super::air_quality::analyze_co2;
use super::comfort::analyze_comfort;
use super::occupancy::analyze_occupancy;
use super::stats::round_to;
use super::AnalysisOutcome;
use crate::services::store::{DateWindow, SensorTable};
use crate::time::format_timestamp;

/// Headline metrics of one window. Metrics the window cannot support are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSnapshot {
    pub start: Option<String>,
    pub end: Option<String>,
    pub records: usize,
    pub co2_average_ppm: Option<f64>,
    pub co2_efficiency_score: Option<f64>,
    pub comfort_percentage: Option<f64>,
    pub motion_events: Option<usize>,
}

/// `period2 - period1` for every metric both periods have.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodDeltas {
    pub records: i64,
    pub co2_average_ppm: Option<f64>,
    pub co2_efficiency_score: Option<f64>,
    pub comfort_percentage: Option<f64>,
    pub motion_events: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub period1: PeriodSnapshot,
    pub period2: PeriodSnapshot,
    pub deltas: PeriodDeltas,
}

fn snapshot(table: &SensorTable, window: &DateWindow) -> PeriodSnapshot {
    let co2 = analyze_co2(table, window).ready();
    let comfort = analyze_comfort(table, window)
        .ready()
        .and_then(|c| c.comfort_insights);
    let occupancy = analyze_occupancy(table, window).ready();
    PeriodSnapshot {
        start: window.start.map(format_timestamp),
        end: window.end.map(format_timestamp),
        records: table.window(window).len(),
        co2_average_ppm: co2.as_ref().map(|c| c.co2_statistics.average_ppm),
        co2_efficiency_score: co2
            .as_ref()
            .map(|c| round_to(c.sustainability_insights.energy_efficiency_score, 2)),
        comfort_percentage: comfort.map(|c| c.optimal_comfort_conditions.percentage),
        motion_events: occupancy.map(|o| o.occupancy_summary.total_motion_events),
    }
}

fn delta(before: Option<f64>, after: Option<f64>) -> Option<f64> {
    Some(round_to(after? - before?, 2))
}

/// Compares two windows of the same table.
pub fn compare_periods(
    table: &SensorTable,
    period1: &DateWindow,
    period2: &DateWindow,
) -> AnalysisOutcome<PeriodComparison> {
    if table.is_empty() {
        return AnalysisOutcome::no_data(super::NO_DATA);
    }
    let first = snapshot(table, period1);
    let second = snapshot(table, period2);
    if first.records == 0 && second.records == 0 {
        return AnalysisOutcome::no_data("No data available for either period");
    }

    let deltas = PeriodDeltas {
        records: second.records as i64 - first.records as i64,
        co2_average_ppm: delta(first.co2_average_ppm, second.co2_average_ppm),
        co2_efficiency_score: delta(first.co2_efficiency_score, second.co2_efficiency_score),
        comfort_percentage: delta(first.comfort_percentage, second.comfort_percentage),
        motion_events: first
            .motion_events
            .zip(second.motion_events)
            .map(|(a, b)| b as i64 - a as i64),
    };
    AnalysisOutcome::Ready(PeriodComparison {
        period1: first,
        period2: second,
        deltas,
    })
}

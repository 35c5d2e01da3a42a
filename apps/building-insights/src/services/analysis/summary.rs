use serde::Serialize;

use super::stats::{round_to, summarize};
use super::{windowed, AnalysisOutcome, TimeSpan};
use crate::services::store::{DateWindow, SensorRecord, SensorTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub total_records: usize,
    pub date_range: TimeSpan,
    pub building_id: String,
    pub sensors: SensorCoverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorCoverage {
    pub co2: SensorSummary,
    pub temperature: SensorSummary,
    pub humidity: SensorSummary,
    pub light: SensorSummary,
    pub pir_motion: MotionSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSummary {
    pub available_records: usize,
    pub avg_value: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl SensorSummary {
    fn over(records: &[SensorRecord], pick: impl Fn(&SensorRecord) -> Option<f64>) -> Self {
        let values: Vec<f64> = records.iter().filter_map(pick).collect();
        let summary = summarize(&values);
        Self {
            available_records: values.len(),
            avg_value: summary.map(|s| round_to(s.mean, 2)),
            min_value: summary.map(|s| round_to(s.min, 2)),
            max_value: summary.map(|s| round_to(s.max, 2)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MotionSummary {
    pub available_records: usize,
    pub total_motion_events: usize,
}

/// Coverage overview of the (windowed) table.
pub fn summarize_data(table: &SensorTable, window: &DateWindow) -> AnalysisOutcome<DataSummary> {
    let records = match windowed(table, window) {
        Ok(records) => records,
        Err(reason) => return AnalysisOutcome::NoData(reason),
    };
    let Some(date_range) = TimeSpan::of(records) else {
        return AnalysisOutcome::no_data(super::NO_DATA);
    };
    let building_id = records
        .iter()
        .map(|r| r.building_id.as_str())
        .find(|id| !id.is_empty())
        .unwrap_or_default()
        .to_string();

    let motion: Vec<bool> = records.iter().filter_map(|r| r.motion).collect();

    AnalysisOutcome::Ready(DataSummary {
        total_records: records.len(),
        date_range,
        building_id,
        sensors: SensorCoverage {
            co2: SensorSummary::over(records, |r| r.co2),
            temperature: SensorSummary::over(records, |r| r.temperature),
            humidity: SensorSummary::over(records, |r| r.humidity),
            light: SensorSummary::over(records, |r| r.light),
            pir_motion: MotionSummary {
                available_records: motion.len(),
                total_motion_events: motion.iter().filter(|m| **m).count(),
            },
        },
    })
}

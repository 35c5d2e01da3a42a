use chrono::{Datelike, Timelike, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{windowed, AnalysisOutcome, TimeSpan};
use crate::services::store::{DateWindow, SensorRecord, SensorTable};

pub const OCCUPANCY_RECOMMENDATIONS: [&str; 3] = [
    "Reduce HVAC during low occupancy hours",
    "Optimize lighting schedules based on motion patterns",
    "Consider automated systems for peak usage times",
];

static WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyAnalysis {
    pub occupancy_summary: OccupancySummary,
    /// Motion events per hour of day, only for hours that have motion readings.
    pub hourly_pattern: BTreeMap<u32, usize>,
    /// Motion events per weekday name, only for days that have motion readings.
    pub daily_pattern: BTreeMap<String, usize>,
    pub energy_optimization_insights: EnergyOptimization,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancySummary {
    pub total_motion_events: usize,
    pub monitoring_period: TimeSpan,
    pub peak_activity_hour: u32,
    pub peak_activity_day: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyOptimization {
    pub high_usage_hours: Vec<u32>,
    pub low_usage_hours: Vec<u32>,
    pub recommendations: Vec<String>,
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// First key with the maximal count; `iter` order decides ties.
fn first_peak<K: Copy>(iter: impl Iterator<Item = (K, usize)>) -> Option<K> {
    let mut best: Option<(K, usize)> = None;
    for (key, count) in iter {
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((key, count)),
        }
    }
    best.map(|(key, _)| key)
}

pub fn analyze_occupancy(
    table: &SensorTable,
    window: &DateWindow,
) -> AnalysisOutcome<OccupancyAnalysis> {
    let records = match windowed(table, window) {
        Ok(records) => records,
        Err(reason) => return AnalysisOutcome::NoData(reason),
    };
    let observed: Vec<&SensorRecord> = records.iter().filter(|r| r.motion.is_some()).collect();
    let (Some(first), Some(last)) = (observed.first(), observed.last()) else {
        return AnalysisOutcome::no_data("No motion sensor data available");
    };
    let monitoring_period = TimeSpan {
        start: crate::time::format_timestamp(first.timestamp),
        end: crate::time::format_timestamp(last.timestamp),
    };

    let mut hourly: BTreeMap<u32, usize> = BTreeMap::new();
    let mut daily: [Option<usize>; 7] = [None; 7];
    let mut total = 0usize;
    for record in &observed {
        let hit = usize::from(record.motion == Some(true));
        total += hit;
        *hourly.entry(record.timestamp.hour()).or_default() += hit;
        let slot = &mut daily[record.timestamp.weekday().num_days_from_monday() as usize];
        *slot = Some(slot.unwrap_or(0) + hit);
    }

    let days_seen = || {
        WEEK.iter()
            .zip(daily.iter())
            .filter_map(|(day, count)| count.map(|c| (*day, c)))
    };
    let (Some(peak_hour), Some(peak_day)) = (
        first_peak(hourly.iter().map(|(h, c)| (*h, *c))),
        first_peak(days_seen()),
    ) else {
        return AnalysisOutcome::no_data("No motion sensor data available");
    };

    let mean = hourly.values().sum::<usize>() as f64 / hourly.len() as f64;
    let high_usage_hours = hourly
        .iter()
        .filter(|(_, count)| **count as f64 > mean)
        .map(|(hour, _)| *hour)
        .collect();
    let low_usage_hours = hourly
        .iter()
        .filter(|(_, count)| (**count as f64) < mean * 0.5)
        .map(|(hour, _)| *hour)
        .collect();

    AnalysisOutcome::Ready(OccupancyAnalysis {
        occupancy_summary: OccupancySummary {
            total_motion_events: total,
            monitoring_period,
            peak_activity_hour: peak_hour,
            peak_activity_day: day_name(peak_day).to_string(),
        },
        daily_pattern: days_seen()
            .map(|(day, count)| (day_name(day).to_string(), count))
            .collect(),
        hourly_pattern: hourly,
        energy_optimization_insights: EnergyOptimization {
            high_usage_hours,
            low_usage_hours,
            recommendations: OCCUPANCY_RECOMMENDATIONS
                .iter()
                .map(|r| r.to_string())
                .collect(),
        },
    })
}

//! Pure aggregations over the sensor table.
//!
//! Each analysis takes the table plus an optional [`DateWindow`] and returns an
//! [`AnalysisOutcome`]: a typed result, an explicit "no data" reason, or a failure
//! reason. Nothing here panics or returns `Err` for an empty window.

pub mod air_quality;
pub mod comfort;
pub mod compare;
pub mod occupancy;
pub mod stats;
pub mod summary;

use serde::Serialize;

use crate::services::document::MetricDocument;
use crate::services::store::{DateWindow, SensorRecord, SensorTable};

pub const NO_DATA: &str = "No data available";

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome<T = MetricDocument> {
    Ready(T),
    NoData(String),
    Failed(String),
}

impl<T> AnalysisOutcome<T> {
    pub fn no_data(reason: impl Into<String>) -> Self {
        Self::NoData(reason.into())
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::NoData(_) | Self::Failed(_) => None,
        }
    }
}

impl<T: Serialize> AnalysisOutcome<T> {
    pub fn into_document(self) -> AnalysisOutcome<MetricDocument> {
        match self {
            Self::Ready(value) => match serde_json::to_value(&value) {
                Ok(doc) => AnalysisOutcome::Ready(MetricDocument(doc)),
                Err(err) => AnalysisOutcome::Failed(format!("failed to encode analysis: {err}")),
            },
            Self::NoData(reason) => AnalysisOutcome::NoData(reason),
            Self::Failed(reason) => AnalysisOutcome::Failed(reason),
        }
    }
}

/// Count and share of readings inside a band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandShare {
    pub count: usize,
    pub percentage: f64,
}

impl BandShare {
    pub fn of(count: usize, total: usize) -> Self {
        Self {
            count,
            percentage: stats::percentage(count, total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSpan {
    pub start: String,
    pub end: String,
}

impl TimeSpan {
    /// First and last timestamp of an ordered slice.
    pub fn of(records: &[SensorRecord]) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;
        Some(Self {
            start: crate::time::format_timestamp(first.timestamp),
            end: crate::time::format_timestamp(last.timestamp),
        })
    }
}

/// Window slice, or the reason there is nothing to analyse.
pub(crate) fn windowed<'a>(
    table: &'a SensorTable,
    window: &DateWindow,
) -> Result<&'a [SensorRecord], String> {
    if table.is_empty() {
        return Err(NO_DATA.to_string());
    }
    let records = table.window(window);
    if records.is_empty() {
        return Err("No data available for the specified period".to_string());
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_encodes_ready_values_only() {
        let ready: AnalysisOutcome<BandShare> = AnalysisOutcome::Ready(BandShare::of(1, 4));
        let doc = ready.into_document().ready().expect("ready");
        assert_eq!(doc.resolve_number("percentage"), Ok(Some(25.0)));

        let empty: AnalysisOutcome<BandShare> = AnalysisOutcome::no_data("nothing here");
        assert_eq!(
            empty.into_document(),
            AnalysisOutcome::NoData("nothing here".to_string())
        );
    }

    #[test]
    fn empty_table_and_empty_window_are_no_data() {
        let table = SensorTable::default();
        assert_eq!(windowed(&table, &DateWindow::all()), Err(NO_DATA.to_string()));

        let table = crate::test_support::sample_table();
        let far_future = DateWindow::parse(Some("2099-01-01"), None).expect("window");
        assert!(windowed(&table, &far_future).is_err());
        assert!(windowed(&table, &DateWindow::all()).is_ok());
    }
}

use serde::Serialize;

use super::stats::{round_to, summarize};
use super::{windowed, AnalysisOutcome, BandShare};
use crate::services::store::{DateWindow, SensorTable};

pub const VENTILATION_THRESHOLD_PPM: f64 = 1000.0;

/// CO2 air-quality bands. Upper bounds are inclusive: 400 ppm is still excellent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Co2Band {
    Excellent,
    Good,
    Acceptable,
    Poor,
    VeryPoor,
}

impl Co2Band {
    pub fn classify(ppm: f64) -> Self {
        if ppm <= 400.0 {
            Self::Excellent
        } else if ppm <= 600.0 {
            Self::Good
        } else if ppm <= 1000.0 {
            Self::Acceptable
        } else if ppm <= 1500.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Excellent => 0,
            Self::Good => 1,
            Self::Acceptable => 2,
            Self::Poor => 3,
            Self::VeryPoor => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Co2Analysis {
    pub period: Co2Period,
    pub co2_statistics: Co2Statistics,
    pub air_quality_distribution: AirQualityDistribution,
    pub sustainability_insights: Co2Insights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Co2Period {
    pub start: String,
    pub end: String,
    pub total_readings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Co2Statistics {
    pub average_ppm: f64,
    pub median_ppm: f64,
    pub min_ppm: f64,
    pub max_ppm: f64,
    pub std_ppm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityDistribution {
    pub excellent_0_400ppm: BandShare,
    pub good_400_600ppm: BandShare,
    pub acceptable_600_1000ppm: BandShare,
    pub poor_1000_1500ppm: BandShare,
    pub very_poor_1500plus_ppm: BandShare,
}

impl AirQualityDistribution {
    pub fn total_count(&self) -> usize {
        [
            self.excellent_0_400ppm,
            self.good_400_600ppm,
            self.acceptable_600_1000ppm,
            self.poor_1000_1500ppm,
            self.very_poor_1500plus_ppm,
        ]
        .iter()
        .map(|band| band.count)
        .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Co2Insights {
    pub overall_rating: Co2Band,
    pub ventilation_needed: bool,
    pub energy_efficiency_score: f64,
}

/// 100 at 400 ppm, losing a point per 10 ppm above that, floored at 0 and capped at 100.
pub fn co2_efficiency_score(mean_ppm: f64) -> f64 {
    (100.0 - (mean_ppm - 400.0) / 10.0).clamp(0.0, 100.0)
}

pub fn analyze_co2(table: &SensorTable, window: &DateWindow) -> AnalysisOutcome<Co2Analysis> {
    let records = match windowed(table, window) {
        Ok(records) => records,
        Err(reason) => return AnalysisOutcome::NoData(reason),
    };
    let readings: Vec<f64> = records.iter().filter_map(|r| r.co2).collect();
    let Some(summary) = summarize(&readings) else {
        return AnalysisOutcome::no_data("No CO2 data available for the specified period");
    };

    let mut counts = [0usize; 5];
    for ppm in &readings {
        counts[Co2Band::classify(*ppm).index()] += 1;
    }
    let total = readings.len();
    let share = |band: Co2Band| BandShare::of(counts[band.index()], total);

    // The period covers the whole window slice, including rows without a CO2 value.
    let (start, end) = match super::TimeSpan::of(records) {
        Some(span) => (span.start, span.end),
        None => return AnalysisOutcome::no_data(super::NO_DATA),
    };

    AnalysisOutcome::Ready(Co2Analysis {
        period: Co2Period {
            start,
            end,
            total_readings: total,
        },
        co2_statistics: Co2Statistics {
            average_ppm: round_to(summary.mean, 2),
            median_ppm: round_to(summary.median, 2),
            min_ppm: round_to(summary.min, 2),
            max_ppm: round_to(summary.max, 2),
            std_ppm: summary.std_dev.map(|std| round_to(std, 2)),
        },
        air_quality_distribution: AirQualityDistribution {
            excellent_0_400ppm: share(Co2Band::Excellent),
            good_400_600ppm: share(Co2Band::Good),
            acceptable_600_1000ppm: share(Co2Band::Acceptable),
            poor_1000_1500ppm: share(Co2Band::Poor),
            very_poor_1500plus_ppm: share(Co2Band::VeryPoor),
        },
        sustainability_insights: Co2Insights {
            overall_rating: Co2Band::classify(summary.mean),
            ventilation_needed: summary.mean > VENTILATION_THRESHOLD_PPM,
            energy_efficiency_score: co2_efficiency_score(summary.mean),
        },
    })
}

//! Sustainability report assembly and the narrated report pipeline.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::services::analysis::air_quality::{analyze_co2, Co2Analysis};
use crate::services::analysis::comfort::{analyze_comfort, ComfortAnalysis};
use crate::services::analysis::occupancy::{analyze_occupancy, OccupancyAnalysis};
use crate::services::analysis::stats::round_to;
use crate::services::analysis::summary::{summarize_data, DataSummary};
use crate::services::analysis::{AnalysisOutcome, TimeSpan};
use crate::services::document::MetricDocument;
use crate::services::generator::{narrate, Narrative, TextGenerator};
use crate::services::store::{DateWindow, SensorTable};

pub const DEFAULT_SUSTAINABILITY_SCORE: f64 = 50.0;
pub const DEFAULT_USER_QUERY: &str = "Generate a comprehensive sustainability report";
pub const PRIORITY_RECOMMENDATIONS: usize = 3;

const POOR_VENTILATION_FINDING: &str =
    "CO2 levels indicate poor ventilation - immediate action needed";
const SUBOPTIMAL_COMFORT_FINDING: &str =
    "Environmental conditions are suboptimal for comfort and efficiency";
const VENTILATION_RECOMMENDATION: &str = "Improve ventilation system to reduce CO2 levels";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    #[default]
    Comprehensive,
    Co2Focused,
    EnergyEfficiency,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::Co2Focused => "co2_focused",
            Self::EnergyEfficiency => "energy_efficiency",
        }
    }

    fn focus(self) -> &'static str {
        match self {
            Self::Comprehensive => {
                "Cover air quality, occupancy and thermal comfort with equal weight."
            }
            Self::Co2Focused => {
                "Concentrate on indoor air quality, CO2 levels and ventilation performance."
            }
            Self::EnergyEfficiency => {
                "Concentrate on energy savings from HVAC, lighting and occupancy-driven scheduling."
            }
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "" | "comprehensive" => Ok(Self::Comprehensive),
            "co2" | "co2_focused" => Ok(Self::Co2Focused),
            "energy" | "energy_efficiency" => Ok(Self::EnergyEfficiency),
            other => Err(format!(
                "unknown report type '{other}' (expected comprehensive, co2-focused or energy-efficiency)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SustainabilityReport {
    pub report_metadata: ReportMetadata,
    pub executive_summary: ExecutiveSummary,
    pub detailed_analysis: DetailedAnalysis,
    pub data_summary: DataSummary,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub report_type: ReportType,
    pub building_id: String,
    pub analysis_period: TimeSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub total_records_analyzed: usize,
    pub overall_sustainability_score: f64,
    pub key_findings: Vec<String>,
    pub priority_recommendations: Vec<String>,
}

/// Sections that had nothing to analyse are `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedAnalysis {
    pub air_quality: Option<Co2Analysis>,
    pub occupancy_patterns: Option<OccupancyAnalysis>,
    pub environmental_comfort: Option<ComfortAnalysis>,
}

fn section<T>(name: &str, outcome: AnalysisOutcome<T>) -> Option<T> {
    match outcome {
        AnalysisOutcome::Ready(value) => Some(value),
        AnalysisOutcome::NoData(reason) => {
            tracing::debug!(section = name, reason = %reason, "report section has no data");
            None
        }
        AnalysisOutcome::Failed(reason) => {
            tracing::warn!(section = name, reason = %reason, "report section failed");
            None
        }
    }
}

/// Mean of the section efficiency scores that could be computed.
fn overall_score(detail: &DetailedAnalysis) -> f64 {
    let scores: Vec<f64> = [
        detail
            .air_quality
            .as_ref()
            .map(|a| a.sustainability_insights.energy_efficiency_score),
        detail
            .environmental_comfort
            .as_ref()
            .and_then(|c| c.comfort_insights.as_ref())
            .map(|c| c.energy_efficiency_score),
    ]
    .into_iter()
    .flatten()
    .collect();
    if scores.is_empty() {
        return DEFAULT_SUSTAINABILITY_SCORE;
    }
    round_to(scores.iter().sum::<f64>() / scores.len() as f64, 1)
}

fn key_findings(detail: &DetailedAnalysis) -> Vec<String> {
    let mut findings = Vec::new();
    if detail
        .air_quality
        .as_ref()
        .is_some_and(|a| a.co2_statistics.average_ppm > 1000.0)
    {
        findings.push(POOR_VENTILATION_FINDING.to_string());
    }
    if detail
        .environmental_comfort
        .as_ref()
        .and_then(|c| c.comfort_insights.as_ref())
        .is_some_and(|c| c.optimal_comfort_conditions.percentage < 50.0)
    {
        findings.push(SUBOPTIMAL_COMFORT_FINDING.to_string());
    }
    findings
}

fn recommendations(detail: &DetailedAnalysis) -> Vec<String> {
    let mut out = Vec::new();
    if detail
        .air_quality
        .as_ref()
        .is_some_and(|a| a.sustainability_insights.ventilation_needed)
    {
        out.push(VENTILATION_RECOMMENDATION.to_string());
    }
    if let Some(occupancy) = &detail.occupancy_patterns {
        out.extend(
            occupancy
                .energy_optimization_insights
                .recommendations
                .iter()
                .cloned(),
        );
    }
    if let Some(insights) = detail
        .environmental_comfort
        .as_ref()
        .and_then(|c| c.comfort_insights.as_ref())
    {
        out.extend(insights.recommendations.iter().cloned());
    }
    out
}

/// Runs every analysis over the window and composes the report.
///
/// The report type only labels the document; every section is always computed.
pub fn build_report(
    table: &SensorTable,
    window: &DateWindow,
    report_type: ReportType,
) -> AnalysisOutcome<SustainabilityReport> {
    let data_summary = match summarize_data(table, window) {
        AnalysisOutcome::Ready(summary) => summary,
        AnalysisOutcome::NoData(_) => {
            return AnalysisOutcome::no_data("No data available for report generation")
        }
        AnalysisOutcome::Failed(reason) => return AnalysisOutcome::Failed(reason),
    };

    let detailed_analysis = DetailedAnalysis {
        air_quality: section("air_quality", analyze_co2(table, window)),
        occupancy_patterns: section("occupancy_patterns", analyze_occupancy(table, window)),
        environmental_comfort: section("environmental_comfort", analyze_comfort(table, window)),
    };
    let recommendations = recommendations(&detailed_analysis);

    AnalysisOutcome::Ready(SustainabilityReport {
        report_metadata: ReportMetadata {
            report_type,
            building_id: data_summary.building_id.clone(),
            analysis_period: data_summary.date_range.clone(),
        },
        executive_summary: ExecutiveSummary {
            total_records_analyzed: data_summary.total_records,
            overall_sustainability_score: overall_score(&detailed_analysis),
            key_findings: key_findings(&detailed_analysis),
            priority_recommendations: recommendations
                .iter()
                .take(PRIORITY_RECOMMENDATIONS)
                .cloned()
                .collect(),
        },
        detailed_analysis,
        data_summary,
        recommendations,
    })
}

/// [`build_report`] rendered as a generic metric document.
pub fn assemble_report(
    table: &SensorTable,
    window: &DateWindow,
    report_type: ReportType,
) -> AnalysisOutcome<MetricDocument> {
    build_report(table, window, report_type).into_document()
}

pub fn build_prompt(
    report: &MetricDocument,
    report_type: ReportType,
    user_query: &str,
) -> String {
    let data = serde_json::to_string_pretty(&report.0).unwrap_or_else(|_| report.0.to_string());
    format!(
        "You are a sustainability expert analysing smart building sensor data.\n\
         Use the data analysis below to answer the request.\n\n\
         Data Analysis:\n{data}\n\n\
         User Query: {user_query}\n\n\
         Focus: {focus}\n\n\
         Please provide:\n\
         1. A clear summary of the building's sustainability performance\n\
         2. Key environmental insights from the sensor data\n\
         3. Specific recommendations for improving energy efficiency\n\
         4. Actions to enhance occupant comfort while reducing environmental impact\n\
         5. Metrics and benchmarks for tracking progress\n\n\
         Quote figures exactly as given, for example \"Average CO2 levels: 650 ppm\" \
         or \"sustainability score of 72.5%\". \
         Format the response as a professional sustainability report with clear sections.",
        focus = report_type.focus(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ReportSummary {
    pub data_points_analyzed: usize,
    pub sustainability_score: f64,
    pub key_recommendations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub report_type: ReportType,
    pub user_query: String,
    pub narrative: Narrative,
    pub structured: MetricDocument,
    pub summary: ReportSummary,
}

pub struct NarrationSettings<'a> {
    pub model: &'a str,
    pub timeout: Duration,
}

/// A report assembled from the table and waiting on narration.
#[derive(Debug, Clone)]
pub struct PreparedReport {
    pub report_type: ReportType,
    pub user_query: String,
    pub prompt: String,
    pub structured: MetricDocument,
    pub summary: ReportSummary,
}

/// Builds the structured report, its summary and the narration prompt.
/// Runs entirely against the table and never touches the generator.
pub fn prepare_report(
    table: &SensorTable,
    report_type: ReportType,
    user_query: Option<&str>,
) -> AnalysisOutcome<PreparedReport> {
    let report = match build_report(table, &DateWindow::all(), report_type) {
        AnalysisOutcome::Ready(report) => report,
        AnalysisOutcome::NoData(reason) => return AnalysisOutcome::NoData(reason),
        AnalysisOutcome::Failed(reason) => return AnalysisOutcome::Failed(reason),
    };
    let summary = ReportSummary {
        data_points_analyzed: report.executive_summary.total_records_analyzed,
        sustainability_score: report.executive_summary.overall_sustainability_score,
        key_recommendations: report.executive_summary.priority_recommendations.clone(),
    };
    let structured = match AnalysisOutcome::Ready(report).into_document() {
        AnalysisOutcome::Ready(doc) => doc,
        AnalysisOutcome::NoData(reason) => return AnalysisOutcome::NoData(reason),
        AnalysisOutcome::Failed(reason) => return AnalysisOutcome::Failed(reason),
    };

    let user_query = user_query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(DEFAULT_USER_QUERY)
        .to_string();
    let prompt = build_prompt(&structured, report_type, &user_query);

    AnalysisOutcome::Ready(PreparedReport {
        report_type,
        user_query,
        prompt,
        structured,
        summary,
    })
}

/// Asks the generator to narrate a prepared report. A generator failure
/// still yields a report carrying the failure sentinel.
pub async fn narrate_report(
    prepared: PreparedReport,
    generator: &dyn TextGenerator,
    settings: NarrationSettings<'_>,
) -> GeneratedReport {
    let narrative = narrate(generator, &prepared.prompt, settings.model, settings.timeout).await;

    tracing::info!(
        report_type = %prepared.report_type,
        records = prepared.summary.data_points_analyzed,
        score = prepared.summary.sustainability_score,
        narrated = narrative.ok,
        "generated sustainability report"
    );

    GeneratedReport {
        report_type: prepared.report_type,
        user_query: prepared.user_query,
        narrative,
        structured: prepared.structured,
        summary: prepared.summary,
    }
}

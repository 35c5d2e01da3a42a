use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::time::{parse_timestamp, parse_window_end, parse_window_start};

/// One timestamped observation. Sensors that did not report are `None`, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRecord {
    pub timestamp: NaiveDateTime,
    pub building_id: String,
    pub co2: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub light: Option<f64>,
    pub motion: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "datetime")]
    timestamp: String,
    #[serde(default)]
    building_id: Option<String>,
    #[serde(default)]
    co2: Option<f64>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
    #[serde(default)]
    light: Option<f64>,
    #[serde(default, alias = "pir")]
    motion: Option<String>,
}

impl CsvRow {
    fn into_record(self) -> Result<SensorRecord, String> {
        let timestamp = parse_timestamp(&self.timestamp)?;
        let motion = match self.motion.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_motion(raw)?),
        };
        Ok(SensorRecord {
            timestamp,
            building_id: self
                .building_id
                .map(|id| id.trim().to_string())
                .unwrap_or_default(),
            co2: self.co2.filter(|v| v.is_finite()),
            temperature: self.temperature.filter(|v| v.is_finite()),
            humidity: self.humidity.filter(|v| v.is_finite()),
            light: self.light.filter(|v| v.is_finite()),
            motion,
        })
    }
}

fn parse_motion(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" => return Ok(true),
        "false" | "no" => return Ok(false),
        _ => {}
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v > 0.0)
        .ok_or_else(|| format!("motion value '{raw}' is not a boolean or number"))
}

/// Immutable, timestamp-ordered sensor table.
#[derive(Debug, Clone, Default)]
pub struct SensorTable {
    records: Vec<SensorRecord>,
}

impl SensorTable {
    pub fn new(mut records: Vec<SensorRecord>) -> Self {
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Self { records }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();
        for (idx, row) in csv.deserialize::<CsvRow>().enumerate() {
            // +2: header line plus 1-based numbering
            let line = idx + 2;
            let row = row.with_context(|| format!("failed to parse sensor row at line {line}"))?;
            let record = row
                .into_record()
                .map_err(|err| anyhow::anyhow!("invalid sensor row at line {line}: {err}"))?;
            records.push(record);
        }
        Ok(Self::new(records))
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open sensor dataset {}", path.display()))?;
        Self::from_reader(file)
    }

    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose timestamp falls inside the window (both bounds inclusive).
    pub fn window(&self, window: &DateWindow) -> &[SensorRecord] {
        let lo = window
            .start
            .map(|start| self.records.partition_point(|r| r.timestamp < start))
            .unwrap_or(0);
        let hi = window
            .end
            .map(|end| self.records.partition_point(|r| r.timestamp <= end))
            .unwrap_or(self.records.len());
        if lo >= hi {
            return &[];
        }
        &self.records[lo..hi]
    }
}

/// Optional inclusive date range applied before any aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateWindow {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Builds a window from optional query strings; blank strings mean "unbounded".
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, String> {
        let start = match start.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => Some(parse_window_start(raw).map_err(|err| format!("start_date: {err}"))?),
            None => None,
        };
        let end = match end.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => Some(parse_window_end(raw).map_err(|err| format!("end_date: {err}"))?),
            None => None,
        };
        Ok(Self { start, end })
    }
}

/// Process-wide sensor table, loaded at most once on first use.
///
/// The `OnceLock` is the initialisation gate: racing first callers block until the
/// single load finishes and then all observe the same table. A failed load leaves an
/// empty table in place, which every analysis reports as "no data".
pub struct MetricStore {
    source: Option<PathBuf>,
    table: OnceLock<SensorTable>,
}

impl MetricStore {
    pub fn lazy(source: PathBuf) -> Self {
        Self {
            source: Some(source),
            table: OnceLock::new(),
        }
    }

    pub fn preloaded(table: SensorTable) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(table);
        Self {
            source: None,
            table: cell,
        }
    }

    pub fn table(&self) -> &SensorTable {
        self.table.get_or_init(|| self.load())
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    fn load(&self) -> SensorTable {
        let Some(path) = self.source.as_deref() else {
            return SensorTable::default();
        };
        match SensorTable::from_csv_path(path) {
            Ok(table) => {
                tracing::info!(
                    path = %path.display(),
                    records = table.len(),
                    "loaded building sensor data"
                );
                table
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %format!("{err:#}"),
                    "failed to load sensor data; serving an empty table"
                );
                SensorTable::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use std::sync::Arc;

    const CSV: &str = "\
datetime,building_id,co2,temperature,humidity,light,pir
2024-01-02 09:00:00,413,650.5,21.5,45,300,1
2024-01-01 08:00:00,413,420,19.5,38,,0
2024-01-03 10:30:00,413,,23,,120,
";

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .expect("date")
            .and_hms_opt(h, 0, 0)
            .expect("time")
    }

    #[test]
    fn loads_and_sorts_records_with_missing_values() {
        let table = SensorTable::from_reader(CSV.as_bytes()).expect("parse");
        assert_eq!(table.len(), 3);
        let records = table.records();
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(records[0].co2, Some(420.0));
        assert_eq!(records[0].light, None);
        assert_eq!(records[0].motion, Some(false));
        assert_eq!(records[1].motion, Some(true));
        assert_eq!(records[2].co2, None);
        assert_eq!(records[2].humidity, None);
        assert_eq!(records[2].motion, None);
        assert_eq!(records[2].building_id, "413");
    }

    #[test]
    fn accepts_canonical_column_names() {
        let csv = "timestamp,building_id,co2,temperature,humidity,light,motion\n\
                   2024-01-01T00:00:00,B1,500,20,50,10,true\n";
        let table = SensorTable::from_reader(csv.as_bytes()).expect("parse");
        assert_eq!(table.records()[0].motion, Some(true));
        assert_eq!(table.records()[0].building_id, "B1");
    }

    #[test]
    fn rejects_malformed_rows() {
        let csv = "datetime,building_id,co2\nnot-a-date,413,500\n";
        assert!(SensorTable::from_reader(csv.as_bytes()).is_err());
        let csv = "datetime,building_id,co2\n2024-01-01 00:00:00,413,lots\n";
        assert!(SensorTable::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let table = SensorTable::from_reader(CSV.as_bytes()).expect("parse");
        let window = DateWindow::between(Some(at(1, 8)), Some(at(2, 9)));
        assert_eq!(table.window(&window).len(), 2);
        assert_eq!(table.window(&DateWindow::all()).len(), 3);
        let after = DateWindow::between(Some(at(4, 0)), None);
        assert!(table.window(&after).is_empty());
        let inverted = DateWindow::between(Some(at(3, 0)), Some(at(1, 0)));
        assert!(table.window(&inverted).is_empty());
    }

    #[test]
    fn parses_window_strings() {
        let window = DateWindow::parse(Some("2024-01-02"), Some("2024-01-02")).expect("window");
        let table = SensorTable::from_reader(CSV.as_bytes()).expect("parse");
        assert_eq!(table.window(&window).len(), 1);
        assert_eq!(DateWindow::parse(Some(" "), None).expect("blank"), DateWindow::all());
        assert!(DateWindow::parse(Some("someday"), None).is_err());
    }

    #[test]
    fn missing_dataset_degrades_to_empty_table() {
        let store = MetricStore::lazy(PathBuf::from("/definitely/not/here.csv"));
        assert!(!store.is_loaded());
        assert!(store.table().is_empty());
        assert!(store.is_loaded());
    }

    #[test]
    fn concurrent_first_use_loads_once() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(CSV.as_bytes()).expect("write");
        let store = Arc::new(MetricStore::lazy(file.path().to_path_buf()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.table() as *const SensorTable as usize)
            })
            .collect();
        let addrs: Vec<usize> = handles
            .into_iter()
            .map(|h| h.join().expect("join"))
            .collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.table().len(), 3);
    }
}

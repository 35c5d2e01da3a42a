use crate::config::InsightsConfig;
use crate::services::facts::ClaimRegistry;
use crate::services::generator::{GenerateError, TextGenerator};
use crate::services::store::{MetricStore, SensorRecord, SensorTable};
use crate::state::AppState;
use crate::time::parse_timestamp;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Building 413 record with no light reading.
pub fn record(
    timestamp: &str,
    co2: Option<f64>,
    temperature: Option<f64>,
    humidity: Option<f64>,
    motion: Option<bool>,
) -> SensorRecord {
    SensorRecord {
        timestamp: parse_timestamp(timestamp).expect("timestamp"),
        building_id: "413".to_string(),
        co2,
        temperature,
        humidity,
        light: None,
        motion,
    }
}

/// Seven readings across Monday 2024-01-01 and Tuesday 2024-01-02.
///
/// CO2 mean 833.33 (one reading per band except two in 400-600), temperature mean
/// 21.67, humidity mean 48.67, 3 of 5 paired rows comfortable, peak hour 8 (tied
/// with 9), peak day Monday, 5 motion events.
pub fn sample_table() -> SensorTable {
    let rows = [
        ("2024-01-01 08:00:00", Some(380.0), Some(19.0), Some(35.0), Some(100.0), Some(true)),
        ("2024-01-01 09:00:00", Some(550.0), Some(21.0), Some(45.0), Some(300.0), Some(true)),
        ("2024-01-01 10:00:00", Some(800.0), Some(22.0), Some(50.0), Some(350.0), Some(true)),
        ("2024-01-01 14:00:00", Some(1200.0), Some(25.0), Some(65.0), Some(320.0), Some(false)),
        ("2024-01-02 08:00:00", Some(1600.0), Some(23.0), Some(55.0), Some(280.0), Some(true)),
        ("2024-01-02 09:00:00", None, Some(20.0), None, Some(200.0), Some(true)),
        ("2024-01-02 22:00:00", Some(470.0), None, Some(42.0), Some(10.0), None),
    ];
    SensorTable::new(
        rows.into_iter()
            .map(|(ts, co2, temperature, humidity, light, motion)| SensorRecord {
                light,
                ..record(ts, co2, temperature, humidity, motion)
            })
            .collect(),
    )
}

pub fn test_config() -> InsightsConfig {
    InsightsConfig {
        dataset_path: PathBuf::from("/nonexistent/building_413_data.csv"),
        ollama_url: "http://127.0.0.1:9".to_string(),
        model_name: "llama3.1".to_string(),
        llm_timeout: Duration::from_secs(1),
        chat_timeout: Duration::from_secs(1),
        setup_config_path: None,
    }
}

/// Generator that answers every prompt with a fixed reply, or always fails.
pub struct CannedGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _model: &str,
        _timeout: Duration,
    ) -> Result<String, GenerateError> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());
        self.reply
            .clone()
            .ok_or(GenerateError::Status(StatusCode::SERVICE_UNAVAILABLE))
    }

    async fn list_models(&self) -> Result<serde_json::Value, GenerateError> {
        match self.reply {
            Some(_) => Ok(serde_json::json!({ "models": [{ "name": "llama3.1:latest" }] })),
            None => Err(GenerateError::Status(StatusCode::SERVICE_UNAVAILABLE)),
        }
    }
}

pub fn state_with(table: SensorTable, generator: Arc<dyn TextGenerator>) -> AppState {
    AppState {
        config: test_config(),
        store: Arc::new(MetricStore::preloaded(table)),
        claims: ClaimRegistry::builtin(),
        generator,
    }
}

pub fn test_state() -> AppState {
    state_with(
        sample_table(),
        Arc::new(CannedGenerator::replying("Average CO2 levels: 833.33 ppm.")),
    )
}

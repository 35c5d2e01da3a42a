use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "building-insights",
    version,
    about = "Building sensor analytics and sustainability report server"
)]
pub struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 5001)]
    pub port: u16,
    /// Sensor CSV to serve; overrides INSIGHTS_DATASET_PATH.
    #[arg(long)]
    pub dataset: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub print_openapi: bool,
}

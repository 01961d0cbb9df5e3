use crate::RenderOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings read from an optional JSON file. CLI flags take precedence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_data")]
    pub data: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub render: RenderOptions,
}

fn default_data() -> PathBuf { PathBuf::from("Airbnb_data.csv") }
fn default_output_dir() -> PathBuf { PathBuf::from("charts") }
fn default_top_n() -> usize { 10 }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data: default_data(),
            output_dir: default_output_dir(),
            top_n: default_top_n(),
            render: RenderOptions::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse config JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_json(&text)
    }
}

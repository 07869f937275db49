use anyhow::{Result, bail};
use serde::Deserialize;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

pub const DEFAULT_URL_TEMPLATE: &str = "https://www.senado.gob.ar/votaciones/verActaVotacion/{}";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url_template: String, // "{}" is replaced by the act identifier
    pub cache_dir: PathBuf,
    pub timeout_secs: u64,
    pub reuse_cache: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            cache_dir: PathBuf::from("senate_votations"),
            timeout_secs: 30,
            reuse_cache: false,
        }
    }
}

impl SourceConfig {
    pub fn url_for(&self, id: u64) -> String {
        self.url_template.replacen("{}", &id.to_string(), 1)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub output_dir: PathBuf,
    pub file_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_prefix: "senate_voting_data".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn year_path(&self, year: i32) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.json", self.file_prefix, year))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub start_id: u64,         // first identifier attempted
    pub end_id: Option<u64>,   // last identifier attempted, if bounded
    pub failure_threshold: u32,
    pub first_year: i32,
    pub last_year: i32,
    pub resume: bool,          // continue after the highest stored act_id
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_id: 2433,
            end_id: None,
            failure_threshold: 5,
            first_year: 2000,
            last_year: 2030,
            resume: true,
        }
    }
}

impl RunConfig {
    pub fn year_range(&self) -> RangeInclusive<i32> {
        self.first_year..=self.last_year
    }
}

impl Config {
    /// Reads a TOML config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.source.url_template.contains("{}") {
            bail!(
                "url_template must contain a {{}} placeholder: {}",
                self.source.url_template
            );
        }
        if self.run.failure_threshold == 0 {
            bail!("failure_threshold must be at least 1");
        }
        if self.run.first_year > self.run.last_year {
            bail!(
                "first_year {} is after last_year {}",
                self.run.first_year,
                self.run.last_year
            );
        }
        if let Some(end_id) = self.run.end_id {
            if end_id < self.run.start_id {
                bail!("end_id {end_id} is before start_id {}", self.run.start_id);
            }
        }
        Ok(())
    }
}

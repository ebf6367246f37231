//! Bootstrap configuration loaded from a TOML file, with command-line
//! overrides applied on top. Grounded on `wkmp-ap/src/config.rs`'s
//! TOML-plus-override pattern, generalized from a single flat struct to the
//! per-stage/per-target nested tables §6 requires.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use ohp_store::Stage;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, #[source] source: toml::de::Error },

    #[error("missing provider route for capability '{0}'")]
    MissingProviderRoute(String),
}

#[derive(Debug, Clone, Deserialize)]
struct TomlConfig {
    #[serde(default)]
    paths: PathsSection,
    #[serde(default)]
    concurrency: ConcurrencySection,
    #[serde(default)]
    retries: RetriesSection,
    #[serde(default)]
    lease_ttl: LeaseTtlSection,
    #[serde(default)]
    translation: TranslationSection,
    #[serde(default)]
    qa: QaSection,
    #[serde(default)]
    providers: HashMap<String, ProviderRoute>,
}

#[derive(Debug, Clone, Deserialize)]
struct PathsSection {
    #[serde(default = "default_output_root")]
    output_root: PathBuf,
    #[serde(default = "default_db_path")]
    database_path: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self { output_root: default_output_root(), database_path: default_db_path() }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("output")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("ohp.sqlite3")
}

#[derive(Debug, Clone, Deserialize)]
struct ConcurrencySection {
    #[serde(default = "default_transcription_concurrency")]
    transcription: usize,
    #[serde(default = "default_translation_concurrency")]
    translation: usize,
    #[serde(default = "default_evaluation_concurrency")]
    evaluation: usize,
}

impl Default for ConcurrencySection {
    fn default() -> Self {
        Self {
            transcription: default_transcription_concurrency(),
            translation: default_translation_concurrency(),
            evaluation: default_evaluation_concurrency(),
        }
    }
}

fn default_transcription_concurrency() -> usize {
    10
}
fn default_translation_concurrency() -> usize {
    8
}
fn default_evaluation_concurrency() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize)]
struct RetriesSection {
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    #[serde(default = "default_base_ms")]
    base_ms: u64,
    #[serde(default = "default_cap_ms")]
    cap_ms: u64,
}

impl Default for RetriesSection {
    fn default() -> Self {
        Self { max_attempts: default_max_attempts(), base_ms: default_base_ms(), cap_ms: default_cap_ms() }
    }
}

fn default_max_attempts() -> u32 {
    5
}
fn default_base_ms() -> u64 {
    500
}
fn default_cap_ms() -> u64 {
    60_000
}

#[derive(Debug, Clone, Deserialize)]
struct LeaseTtlSection {
    #[serde(default = "default_transcription_lease_minutes")]
    transcription_minutes: i64,
    #[serde(default = "default_translation_lease_minutes")]
    translation_minutes: i64,
    #[serde(default = "default_translation_lease_minutes")]
    evaluation_minutes: i64,
}

impl Default for LeaseTtlSection {
    fn default() -> Self {
        Self {
            transcription_minutes: default_transcription_lease_minutes(),
            translation_minutes: default_translation_lease_minutes(),
            evaluation_minutes: default_translation_lease_minutes(),
        }
    }
}

fn default_transcription_lease_minutes() -> i64 {
    120
}
fn default_translation_lease_minutes() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
struct TranslationSection {
    #[serde(default = "default_batch_max_segments")]
    batch_max_segments: usize,
}

impl Default for TranslationSection {
    fn default() -> Self {
        Self { batch_max_segments: default_batch_max_segments() }
    }
}

fn default_batch_max_segments() -> usize {
    20
}

#[derive(Debug, Clone, Default, Deserialize)]
struct QaSection {
    #[serde(default)]
    threshold: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProviderRoute {
    primary: String,
    fallback: Option<String>,
}

/// Fully resolved configuration the orchestrator binary runs with: TOML
/// defaults overlaid with any command-line overrides.
#[derive(Debug, Clone)]
pub struct Config {
    pub output_root: PathBuf,
    pub database_path: PathBuf,
    pub concurrency: HashMap<Stage, usize>,
    pub lease_ttl: HashMap<Stage, chrono::Duration>,
    pub max_attempts: u32,
    pub retry_base_ms: u64,
    pub retry_cap_ms: u64,
    pub batch_max_segments: usize,
    pub qa_threshold: HashMap<String, f64>,
    providers: HashMap<String, ProviderRoute>,
}

pub struct CliOverrides {
    pub output_root: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
}

impl Config {
    pub async fn load(config_path: &Path, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let toml_str = tokio::fs::read_to_string(config_path).await.map_err(|e| ConfigError::Read {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let toml_config: TomlConfig = toml::from_str(&toml_str).map_err(|e| ConfigError::Parse {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(Self::from_toml(toml_config, overrides))
    }

    fn from_toml(toml_config: TomlConfig, overrides: CliOverrides) -> Self {
        let mut concurrency = HashMap::new();
        let mut lease_ttl = HashMap::new();
        for stage in Stage::ALL {
            let (cap, ttl_minutes) = match stage {
                Stage::Transcription => (toml_config.concurrency.transcription, toml_config.lease_ttl.transcription_minutes),
                Stage::TranslationEn | Stage::TranslationDe | Stage::TranslationHe => {
                    (toml_config.concurrency.translation, toml_config.lease_ttl.translation_minutes)
                }
                Stage::EvaluationEn | Stage::EvaluationDe | Stage::EvaluationHe => {
                    (toml_config.concurrency.evaluation, toml_config.lease_ttl.evaluation_minutes)
                }
            };
            concurrency.insert(stage, cap);
            lease_ttl.insert(stage, chrono::Duration::minutes(ttl_minutes));
        }

        Self {
            output_root: overrides.output_root.unwrap_or(toml_config.paths.output_root),
            database_path: overrides.database_path.unwrap_or(toml_config.paths.database_path),
            concurrency,
            lease_ttl,
            max_attempts: toml_config.retries.max_attempts,
            retry_base_ms: toml_config.retries.base_ms,
            retry_cap_ms: toml_config.retries.cap_ms,
            batch_max_segments: toml_config.translation.batch_max_segments,
            qa_threshold: toml_config.qa.threshold,
            providers: toml_config.providers,
        }
    }

    /// Resolves `providers.{capability}.primary`/`.fallback` base URLs, e.g.
    /// capability `"translation_en"`. Errors if the capability has no route
    /// configured at all.
    pub fn provider_route(&self, capability: &str) -> Result<(&str, Option<&str>), ConfigError> {
        let route = self
            .providers
            .get(capability)
            .ok_or_else(|| ConfigError::MissingProviderRoute(capability.to_string()))?;
        Ok((route.primary.as_str(), route.fallback.as_deref()))
    }

    pub fn qa_threshold_for(&self, target_lang: &str) -> f64 {
        self.qa_threshold.get(target_lang).copied().unwrap_or(7.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stage_concurrency_and_lease_ttl_from_spec() {
        let toml_config = TomlConfig {
            paths: PathsSection::default(),
            concurrency: ConcurrencySection::default(),
            retries: RetriesSection::default(),
            lease_ttl: LeaseTtlSection::default(),
            translation: TranslationSection::default(),
            qa: QaSection::default(),
            providers: HashMap::new(),
        };
        let config = Config::from_toml(toml_config, CliOverrides { output_root: None, database_path: None });

        assert_eq!(config.concurrency[&Stage::Transcription], 10);
        assert_eq!(config.concurrency[&Stage::TranslationEn], 8);
        assert_eq!(config.concurrency[&Stage::EvaluationHe], 4);
        assert_eq!(config.lease_ttl[&Stage::Transcription], chrono::Duration::hours(2));
        assert_eq!(config.lease_ttl[&Stage::TranslationDe], chrono::Duration::minutes(30));
    }

    #[test]
    fn cli_override_takes_precedence_over_toml_path() {
        let toml_config = TomlConfig {
            paths: PathsSection { output_root: PathBuf::from("from-toml"), database_path: default_db_path() },
            concurrency: ConcurrencySection::default(),
            retries: RetriesSection::default(),
            lease_ttl: LeaseTtlSection::default(),
            translation: TranslationSection::default(),
            qa: QaSection::default(),
            providers: HashMap::new(),
        };
        let config = Config::from_toml(
            toml_config,
            CliOverrides { output_root: Some(PathBuf::from("from-cli")), database_path: None },
        );

        assert_eq!(config.output_root, PathBuf::from("from-cli"));
    }

    #[test]
    fn missing_provider_route_is_reported_by_capability_name() {
        let toml_config = TomlConfig {
            paths: PathsSection::default(),
            concurrency: ConcurrencySection::default(),
            retries: RetriesSection::default(),
            lease_ttl: LeaseTtlSection::default(),
            translation: TranslationSection::default(),
            qa: QaSection::default(),
            providers: HashMap::new(),
        };
        let config = Config::from_toml(toml_config, CliOverrides { output_root: None, database_path: None });

        let err = config.provider_route("translation_he").unwrap_err();
        assert!(matches!(err, ConfigError::MissingProviderRoute(cap) if cap == "translation_he"));
    }
}

use crate::features::calculator::FEATURE_NAMES;
use crate::utils::error::{PipelineError, Result};
use crate::utils::validation::{self, Validate};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub model: ModelConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub version: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "statcast-career".to_string(),
            version: "0.1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// 早期生涯打席數
    pub n_pa: usize,
    pub min_career_pa: u32,
    pub debut_year_start: i32,
    pub debut_year_end: i32,
    pub data_end_date: NaiveDate,
    pub lookback_years: i32,
    pub earliest_data_year: i32,
    /// 計算第 N 個打席時納入的比賽類型（例行賽加季後賽）
    pub game_types: Vec<String>,
    /// 下載原始逐球資料時保留的比賽類型
    pub fetch_game_types: Vec<String>,
    pub timeline_delay_ms: u64,
    pub fetch_delay_ms: u64,
    pub max_players: Option<usize>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            n_pa: 500,
            min_career_pa: 1000,
            debut_year_start: 2015,
            debut_year_end: 2020,
            data_end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            lookback_years: 3,
            earliest_data_year: 2010,
            game_types: ["R", "F", "D", "L", "W"].map(String::from).to_vec(),
            fetch_game_types: vec!["R".to_string()],
            timeline_delay_ms: 500,
            fetch_delay_ms: 1000,
            max_players: None,
        }
    }
}

impl CollectionConfig {
    /// 排行榜查詢起始年份
    pub fn leaderboard_start_year(&self) -> i32 {
        (self.debut_year_start - self.lookback_years).max(self.earliest_data_year)
    }

    pub fn leaderboard_end_year(&self) -> i32 {
        self.data_end_date.year()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub savant_endpoint: String,
    pub fangraphs_endpoint: String,
    pub register_endpoint: String,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_seconds: u64,
    pub headers: Option<HashMap<String, String>>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            savant_endpoint: "https://baseballsavant.mlb.com/statcast_search/csv".to_string(),
            fangraphs_endpoint: "https://www.fangraphs.com/api/leaders/major-league/data"
                .to_string(),
            register_endpoint:
                "https://github.com/chadwickbureau/register/archive/refs/heads/master.zip"
                    .to_string(),
            timeout_seconds: 120,
            retry_attempts: 3,
            retry_delay_seconds: 5,
            headers: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

/// Relative file layout under `paths.data_dir`.
pub mod layout {
    pub const RAW_STATCAST_DIR: &str = "raw/statcast";
    pub const QUALIFYING_PLAYERS: &str = "processed/qualifying_players.csv";
    pub const PLAYER_TIMELINE: &str = "processed/player_timeline.csv";
    pub const FETCH_LOG: &str = "processed/statcast_fetch_log.csv";
    pub const EARLY_CAREER_STATS: &str = "processed/early_career_stats.csv";
    pub const MODEL: &str = "models/career_model.json";
    pub const PREDICTIONS: &str = "models/predictions.csv";

    pub fn player_statcast(player_id: u32) -> String {
        format!("{}/player_{}.csv", RAW_STATCAST_DIR, player_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerTarget {
    CareerWar,
    CareerPa,
    CareerSeasons,
}

impl CareerTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            CareerTarget::CareerWar => "career_war",
            CareerTarget::CareerPa => "career_pa",
            CareerTarget::CareerSeasons => "career_seasons",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub target: CareerTarget,
    /// Ridge 懲罰項
    pub alpha: f64,
    pub test_fraction: f64,
    pub seed: u64,
    pub features: Option<Vec<String>>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            target: CareerTarget::CareerWar,
            alpha: 1.0,
            test_fraction: 0.2,
            seed: 42,
            features: None,
        }
    }
}

impl ModelConfig {
    pub fn feature_names(&self) -> Vec<String> {
        match &self.features {
            Some(features) => features.clone(),
            None => FEATURE_NAMES.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PipelineError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PipelineError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定者保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PipelineError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("project.name", &self.project.name)?;

        validation::validate_url("sources.savant_endpoint", &self.sources.savant_endpoint)?;
        validation::validate_url("sources.fangraphs_endpoint", &self.sources.fangraphs_endpoint)?;
        validation::validate_url("sources.register_endpoint", &self.sources.register_endpoint)?;
        validation::validate_positive_number(
            "sources.retry_attempts",
            self.sources.retry_attempts as usize,
            1,
        )?;
        validation::validate_positive_number(
            "sources.timeout_seconds",
            self.sources.timeout_seconds as usize,
            1,
        )?;

        validation::validate_path("paths.data_dir", &self.paths.data_dir)?;

        let collection = &self.collection;
        validation::validate_positive_number("collection.n_pa", collection.n_pa, 1)?;
        if (collection.min_career_pa as usize) < collection.n_pa {
            return Err(PipelineError::InvalidConfigValueError {
                field: "collection.min_career_pa".to_string(),
                value: collection.min_career_pa.to_string(),
                reason: format!("Must be at least collection.n_pa ({})", collection.n_pa),
            });
        }
        validation::validate_range(
            "collection.debut_year_start",
            collection.debut_year_start,
            1900,
            collection.debut_year_end,
        )?;
        validation::validate_range(
            "collection.debut_year_end",
            collection.debut_year_end,
            collection.debut_year_start,
            collection.data_end_date.year(),
        )?;
        validation::validate_non_empty_list("collection.game_types", &collection.game_types)?;
        for game_type in &collection.game_types {
            validation::validate_non_empty_string("collection.game_types", game_type)?;
        }
        validation::validate_non_empty_list(
            "collection.fetch_game_types",
            &collection.fetch_game_types,
        )?;
        for game_type in &collection.fetch_game_types {
            validation::validate_non_empty_string("collection.fetch_game_types", game_type)?;
        }
        if let Some(max) = collection.max_players {
            validation::validate_positive_number("collection.max_players", max, 1)?;
        }

        validation::validate_range("model.alpha", self.model.alpha, 0.0, f64::MAX)?;
        validation::validate_range("model.test_fraction", self.model.test_fraction, 0.0, 0.9)?;
        let features = self.model.feature_names();
        validation::validate_non_empty_list("model.features", &features)?;
        validation::validate_allowed_values("model.features", &features, &FEATURE_NAMES)?;

        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.data_dir)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

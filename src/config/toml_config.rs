use crate::adapters::flat_file::{DEFAULT_APPOINTMENTS_FILE, DEFAULT_PETS_FILE};
use crate::adapters::sqlite::DEFAULT_DATABASE_FILE;
use crate::core::availability::DailySchedule;
use crate::domain::ports::{ConfigProvider, StoreBackend};
use crate::utils::error::{ClinicError, Result};
use crate::utils::validation::{self, Validate};
use chrono::NaiveTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_pets_file")]
    pub pets_file: String,
    #[serde(default = "default_appointments_file")]
    pub appointments_file: String,
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// "HH:MM" 格式；未設定時使用預設六個時段
    pub slots: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_pets_file() -> String {
    DEFAULT_PETS_FILE.to_string()
}

fn default_appointments_file() -> String {
    DEFAULT_APPOINTMENTS_FILE.to_string()
}

fn default_database_file() -> String {
    DEFAULT_DATABASE_FILE.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            data_dir: default_data_dir(),
            pets_file: default_pets_file(),
            appointments_file: default_appointments_file(),
            database_file: default_database_file(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ClinicError::Config {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ClinicError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CLINIC_DATA})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern compiles"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn schedule(&self) -> Result<DailySchedule> {
        match &self.schedule.slots {
            Some(_) => DailySchedule::new(self.daily_slots()?),
            None => Ok(DailySchedule::default()),
        }
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.level.as_deref()
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.as_ref().map(|file| {
            if file.is_absolute() {
                file.clone()
            } else {
                self.storage.data_dir.join(file)
            }
        })
    }
}

impl ConfigProvider for TomlConfig {
    fn backend(&self) -> StoreBackend {
        self.storage.backend
    }

    fn data_dir(&self) -> &Path {
        &self.storage.data_dir
    }

    fn pets_file(&self) -> &str {
        &self.storage.pets_file
    }

    fn appointments_file(&self) -> &str {
        &self.storage.appointments_file
    }

    fn database_file(&self) -> &str {
        &self.storage.database_file
    }

    fn daily_slots(&self) -> Result<Vec<NaiveTime>> {
        match &self.schedule.slots {
            Some(slots) => slots
                .iter()
                .map(|slot| {
                    NaiveTime::parse_from_str(slot.trim(), validation::TIME_FORMAT).map_err(|_| {
                        ClinicError::Config {
                            message: format!("schedule.slots: '{}' is not a HH:MM time", slot),
                        }
                    })
                })
                .collect(),
            None => Ok(DailySchedule::default().slots().to_vec()),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        let data_dir = self.storage.data_dir.to_string_lossy();
        validation::validate_path("storage.data_dir", &data_dir)?;
        validation::validate_path("storage.pets_file", &self.storage.pets_file)?;
        validation::validate_path("storage.appointments_file", &self.storage.appointments_file)?;
        validation::validate_path("storage.database_file", &self.storage.database_file)?;

        if self.storage.pets_file == self.storage.appointments_file {
            return Err(ClinicError::Config {
                message: "storage.pets_file and storage.appointments_file must differ".to_string(),
            });
        }

        self.schedule()?;

        if let Some(level) = self.log_level() {
            if !LOG_LEVELS.contains(&level) {
                return Err(ClinicError::Config {
                    message: format!(
                        "logging.level '{}' is not one of {}",
                        level,
                        LOG_LEVELS.join(", ")
                    ),
                });
            }
        }

        Ok(())
    }
}

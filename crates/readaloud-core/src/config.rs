use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub label: LabelConfig,
    #[serde(default)]
    pub narration: NarrationConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path (log file lives here)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Delay between revealed words in milliseconds
    #[serde(default = "default_word_interval")]
    pub word_interval_ms: u64,
    /// Pin the viewport to the bottom while text is revealed
    #[serde(default = "default_true")]
    pub follow_on_start: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            word_interval_ms: default_word_interval(),
            follow_on_start: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Delay between revealed caption characters in milliseconds
    #[serde(default = "default_char_interval")]
    pub char_interval_ms: u64,
    /// Caption shown while text is being produced
    #[serde(default = "default_busy_text")]
    pub busy_text: String,
    /// Caption shown once the text is ready
    #[serde(default = "default_idle_text")]
    pub idle_text: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            char_interval_ms: default_char_interval(),
            busy_text: default_busy_text(),
            idle_text: default_idle_text(),
        }
    }
}

/// Which speech backend drives narration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrationBackend {
    /// Timed stand-in that never produces sound
    #[default]
    Simulated,
    /// External speech program such as espeak-ng
    Command,
}

impl FromStr for NarrationBackend {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" | "sim" => Ok(Self::Simulated),
            "command" | "cmd" | "espeak" => Ok(Self::Command),
            other => Err(crate::Error::Config(format!(
                "unknown narration backend '{}' (expected 'simulated' or 'command')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Speech backend: "simulated" or "command"
    #[serde(default)]
    pub backend: NarrationBackend,
    /// Program used by the command backend
    #[serde(default = "default_program")]
    pub program: String,
    /// Preferred voice id or name, selected once the voice catalog contains it
    #[serde(default)]
    pub voice: Option<String>,
    /// Speech rate (0.5-2.0)
    #[serde(default = "default_one")]
    pub rate: f32,
    /// Speech volume (0.0-1.0)
    #[serde(default = "default_one")]
    pub volume: f32,
    /// Speech pitch (0.5-2.0)
    #[serde(default = "default_one")]
    pub pitch: f32,
    /// Speaking speed of the simulated backend at rate 1.0
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
    /// Restart narration with the new text when a new document arrives mid-playback
    #[serde(default)]
    pub restart_on_new_text: bool,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            backend: NarrationBackend::default(),
            program: default_program(),
            voice: None,
            rate: default_one(),
            volume: default_one(),
            pitch: default_one(),
            words_per_minute: default_words_per_minute(),
            restart_on_new_text: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Upper bound on event polling in milliseconds
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
    /// Show the key help line
    #[serde(default = "default_true")]
    pub show_help: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
            show_help: default_true(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("readaloud")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

fn default_word_interval() -> u64 {
    40
}

fn default_char_interval() -> u64 {
    70
}

fn default_busy_text() -> String {
    "Generating Summary...".to_string()
}

fn default_idle_text() -> String {
    "Answer".to_string()
}

fn default_program() -> String {
    "espeak-ng".to_string()
}

fn default_words_per_minute() -> u32 {
    175
}

fn default_tick_rate() -> u64 {
    20
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, falling back to defaults when it is missing
    pub fn load_from(path: &std::path::Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path, creating parent directories
    pub fn save_to(&self, config_path: &std::path::Path) -> crate::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(config_path, self.to_toml()?)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/readaloud/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("readaloud")
            .join("config.toml")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Log file used while the terminal UI owns stdout
    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("readaloud.log")
    }
}

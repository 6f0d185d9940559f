//! Layered settings.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `stockroom.toml` in the working directory, if present
//! 3. an explicit config file given on the command line
//! 4. `STOCKROOM_*` environment variables (`__` separates nested keys,
//!    e.g. `STOCKROOM_SHOP__LOW_STOCK=5`)

use crate::gradebook::GradeScale;
use crate::report::StockThresholds;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const PROJECT_CONFIG_FILE: &str = "stockroom.toml";
pub const ENV_PREFIX: &str = "STOCKROOM";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which console the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Inventory,
    Shop,
    Grades,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inventory" => Ok(Mode::Inventory),
            "shop" => Ok(Mode::Shop),
            "grades" => Ok(Mode::Grades),
            other => Err(format!(
                "unknown mode '{other}' (expected inventory, shop or grades)"
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Inventory => "inventory",
            Mode::Shop => "shop",
            Mode::Grades => "grades",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: Mode,
    /// Default path for inventory save/load.
    pub data_file: PathBuf,
    /// Default path for catalog save/load in the shop.
    pub catalog_file: PathBuf,
    /// Line-editor history; none when unset.
    pub history_file: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    pub shop: ShopSettings,
    pub grades: GradeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Inventory,
            data_file: PathBuf::from("inventario.csv"),
            catalog_file: PathBuf::from("catalogo.csv"),
            history_file: None,
            log_filter: "warn".to_string(),
            shop: ShopSettings::default(),
            grades: GradeSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopSettings {
    /// Start with the built-in catalog.
    pub seed_catalog: bool,
    /// Rows shown by the top sellers report.
    pub top_limit: usize,
    pub low_stock: u32,
    pub healthy_stock: u32,
    pub rotation_factor: u32,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            seed_catalog: true,
            top_limit: 3,
            low_stock: 10,
            healthy_stock: 20,
            rotation_factor: 3,
        }
    }
}

impl ShopSettings {
    pub fn thresholds(&self) -> StockThresholds {
        StockThresholds {
            low: self.low_stock,
            healthy: self.healthy_stock,
            rotation_factor: self.rotation_factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeSettings {
    pub max_grade: f64,
    pub pass_mark: f64,
    pub good_mark: f64,
    pub excellent_mark: f64,
}

impl Default for GradeSettings {
    fn default() -> Self {
        let scale = GradeScale::default();
        Self {
            max_grade: scale.max,
            pass_mark: scale.pass,
            good_mark: scale.good,
            excellent_mark: scale.excellent,
        }
    }
}

impl GradeSettings {
    pub fn scale(&self) -> GradeScale {
        GradeScale {
            max: self.max_grade,
            pass: self.pass_mark,
            good: self.good_mark,
            excellent: self.excellent_mark,
        }
    }
}

impl Settings {
    /// Reject combinations the consoles cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let shop = &self.shop;
        if shop.low_stock > shop.healthy_stock {
            return Err(ConfigError::Invalid(format!(
                "shop.low_stock ({}) is above shop.healthy_stock ({})",
                shop.low_stock, shop.healthy_stock
            )));
        }
        if shop.top_limit == 0 {
            return Err(ConfigError::Invalid(
                "shop.top_limit must be at least 1".to_string(),
            ));
        }
        let g = &self.grades;
        let ordered = 0.0 < g.max_grade
            && 0.0 <= g.pass_mark
            && g.pass_mark <= g.good_mark
            && g.good_mark <= g.excellent_mark
            && g.excellent_mark <= g.max_grade;
        if !ordered {
            return Err(ConfigError::Invalid(format!(
                "grade marks must satisfy 0 <= pass ({}) <= good ({}) <= excellent ({}) <= max ({})",
                g.pass_mark, g.good_mark, g.excellent_mark, g.max_grade
            )));
        }
        Ok(())
    }
}

/// Builder that merges every settings source.
pub struct SettingsLoader {
    project_dir: PathBuf,
    explicit: Option<PathBuf>,
    env_vars: Option<HashMap<String, String>>,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            explicit: None,
            env_vars: None,
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// A config file that must exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read variables from `vars` instead of the process environment.
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env_vars = Some(vars);
        self
    }

    pub fn load(self) -> Result<Settings, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?);

        let project_file = self.project_dir.join(PROJECT_CONFIG_FILE);
        builder = builder.add_source(
            config::File::from(project_file)
                .required(false)
                .format(config::FileFormat::Toml),
        );

        if let Some(path) = self.explicit {
            builder = builder.add_source(
                config::File::from(path)
                    .required(true)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(self.env_vars),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};
use tracing::{debug, info};

use crate::core::session::DEFAULT_AUTO_FILL_MARGIN;
use crate::core::{ScenarioCatalog, ScoringTable, TraitClassifier, TraitLayout};

fn default_auto_fill_margin() -> usize {
    DEFAULT_AUTO_FILL_MARGIN
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// External scenario catalog; the bundled one is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    /// External scoring table; the built-in one is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_table_path: Option<PathBuf>,
    #[serde(default = "default_auto_fill_margin")]
    pub auto_fill_margin: usize,
    /// tracing filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

/// Catalog and classifier checked against each other
#[derive(Debug, Clone)]
pub struct Engine {
    pub catalog: ScenarioCatalog,
    pub classifier: TraitClassifier,
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(Self::default_data_dir);

        std::fs::create_dir_all(&data_dir)
            .context("Failed to create data directory")?;

        let config_path = data_dir.join("config.json");

        if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .context("Failed to read config.json")?;

            if !config_str.trim().is_empty() {
                let mut config: Config = serde_json::from_str(&config_str)
                    .with_context(|| format!("Failed to parse {}", config_path.display()))?;
                config.data_dir = data_dir;
                debug!("Loaded config from {}", config_path.display());
                return Ok(config);
            }
            debug!("Config file is empty, recreating defaults");
        }

        let config = Self::default_config(data_dir);
        config.save()?;
        info!("Created default config at {}", config_path.display());
        Ok(config)
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("soulmates")
    }

    fn default_config(data_dir: PathBuf) -> Self {
        Config {
            data_dir,
            catalog_path: None,
            scoring_table_path: None,
            auto_fill_margin: default_auto_fill_margin(),
            log_filter: default_log_filter(),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn save(&self) -> Result<()> {
        let json_str = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(self.config_file(), json_str)
            .context("Failed to write config.json")?;
        Ok(())
    }

    /// Relative paths are resolved against the data directory
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn load_catalog(&self) -> Result<ScenarioCatalog> {
        match &self.catalog_path {
            Some(path) => {
                let path = self.resolve(path);
                let catalog = ScenarioCatalog::from_path(&path)
                    .with_context(|| format!("Invalid scenario catalog {}", path.display()))?;
                info!("Loaded {} scenarios from {}", catalog.len(), path.display());
                Ok(catalog)
            }
            None => ScenarioCatalog::bundled().context("Bundled scenario catalog is invalid"),
        }
    }

    pub fn load_scoring_table(&self) -> Result<ScoringTable> {
        match &self.scoring_table_path {
            Some(path) => {
                let path = self.resolve(path);
                let table = ScoringTable::from_path(&path)
                    .with_context(|| format!("Invalid scoring table {}", path.display()))?;
                info!("Loaded scoring table v{} from {}", table.version, path.display());
                Ok(table)
            }
            None => Ok(ScoringTable::default()),
        }
    }

    /// Load both halves and fail when the catalog does not fit the trait layout
    pub fn engine(&self) -> Result<Engine> {
        let catalog = self.load_catalog()?;
        let layout = TraitLayout::standard();
        catalog
            .check_layout(&layout)
            .context("Scenario catalog does not match the trait layout")?;
        let classifier = TraitClassifier::new(self.load_scoring_table()?, layout)?;
        Ok(Engine { catalog, classifier })
    }
}

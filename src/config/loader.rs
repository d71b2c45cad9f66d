//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/codetutor/config.toml)
//! 3. Project config (.codetutor/config.toml)
//! 4. Environment variables (CODETUTOR_* prefix, `__` separates sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, TutorError};

const APP_DIR: &str = "codetutor";
const PROJECT_DIR: &str = ".codetutor";
const ENV_PREFIX: &str = "CODETUTOR_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .map_err(|e| TutorError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // CODETUTOR_LLM__MODEL -> llm.model
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| TutorError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/codetutor/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join(APP_DIR))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(PROJECT_DIR)
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Describe config file locations, marking which exist
    pub fn describe_paths() -> Vec<(&'static str, Option<PathBuf>, bool)> {
        let global = Self::global_config_path();
        let global_exists = global.as_ref().is_some_and(|p| p.exists());
        let project = Self::project_config_path();
        let project_exists = project.exists();

        vec![
            ("Global", global, global_exists),
            ("Project", Some(project), project_exists),
        ]
    }

    /// Render the effective configuration
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| TutorError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write the global config file; existing files are kept unless `force`
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            TutorError::Config("Cannot determine global config directory".to_string())
        })?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_global_config())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Write `.codetutor/config.toml` in the working directory
    pub fn init_project(name: Option<&str>, force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir();
        fs::create_dir_all(&project_dir)?;

        let config_path = Self::project_config_path();
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_project_config(name))?;
            info!("Created project config: {}", config_path.display());
        } else {
            info!("Project config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_global_config() -> String {
        r#"# codetutor Global Configuration
# User-wide defaults. Project settings in .codetutor/config.toml override these.

version = "1.0"

# Generator backend. API keys are read from OPENROUTER_API_KEY / OPENAI_API_KEY.
[llm]
provider = "openrouter"
timeout_secs = 300
temperature = 0.0
"#
        .to_string()
    }

    fn default_project_config(name: Option<&str>) -> String {
        let mut content = String::from(
            r#"# codetutor Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[analysis]
max_files = 100
exclude = [
    "*_test.go",
    "vendor/*",
    "node_modules/*",
    ".git/*",
    "*.min.js",
    "target/*",
]

[tutorial]
output_dir = "tutorial"
max_abstractions = 10
"#,
        );
        if let Some(name) = name {
            content.push_str(&format!("project_name = {:?}\n", name));
        }
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn config_err(e: TutorError) -> figment::Error {
        figment::Error::from(e.to_string())
    }

    /// Point the global config directory inside the jail
    fn isolate(jail: &mut Jail) {
        let xdg = jail.directory().join("xdg");
        jail.set_env("XDG_CONFIG_HOME", xdg.display());
    }

    #[test]
    fn test_load_default_config() {
        Jail::expect_with(|jail| {
            isolate(jail);

            let config = ConfigLoader::load().map_err(config_err)?;
            assert_eq!(config.version, "1.0");
            assert_eq!(config.tutorial.max_abstractions, 10);
            Ok(())
        });
    }

    #[test]
    fn test_project_overrides_global() {
        Jail::expect_with(|jail| {
            isolate(jail);
            jail.create_dir("xdg/codetutor")?;
            jail.create_file(
                "xdg/codetutor/config.toml",
                "[llm]\nprovider = \"ollama\"\nmodel = \"global-model\"\n",
            )?;
            jail.create_dir(".codetutor")?;
            jail.create_file(
                ".codetutor/config.toml",
                "[llm]\nmodel = \"project-model\"\n[tutorial]\nmax_abstractions = 4\n",
            )?;

            let config = ConfigLoader::load().map_err(config_err)?;
            assert_eq!(config.llm.provider, "ollama");
            assert_eq!(config.llm.model.as_deref(), Some("project-model"));
            assert_eq!(config.tutorial.max_abstractions, 4);
            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            isolate(jail);
            jail.set_env("CODETUTOR_LLM__MODEL", "env-model");
            jail.set_env("CODETUTOR_ANALYSIS__MAX_FILES", "7");

            let config = ConfigLoader::load().map_err(config_err)?;
            assert_eq!(config.llm.model.as_deref(), Some("env-model"));
            assert_eq!(config.analysis.max_files, 7);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        Jail::expect_with(|jail| {
            isolate(jail);
            jail.create_dir(".codetutor")?;
            jail.create_file(".codetutor/config.toml", "[llm]\ntemperature = 5.0\n")?;

            let result = ConfigLoader::load();
            assert!(matches!(result, Err(TutorError::Config(_))));
            Ok(())
        });
    }

    #[test]
    fn test_init_project_round_trips() {
        Jail::expect_with(|jail| {
            isolate(jail);

            let path = ConfigLoader::init_project(Some("demo"), false).map_err(config_err)?;
            assert!(path.exists());

            let config = ConfigLoader::load().map_err(config_err)?;
            assert_eq!(config.tutorial.project_name.as_deref(), Some("demo"));
            assert_eq!(config.analysis.max_files, 100);
            Ok(())
        });
    }

    #[test]
    fn test_init_global_respects_force() {
        Jail::expect_with(|jail| {
            isolate(jail);

            let path = ConfigLoader::init_global(false).map_err(config_err)?;
            std::fs::write(&path, "version = \"custom\"\n").map_err(|e| e.to_string())?;

            ConfigLoader::init_global(false).map_err(config_err)?;
            let kept = std::fs::read_to_string(&path).map_err(|e| e.to_string())?;
            assert!(kept.contains("custom"));

            ConfigLoader::init_global(true).map_err(config_err)?;
            let replaced = std::fs::read_to_string(&path).map_err(|e| e.to_string())?;
            assert!(replaced.contains("openrouter"));
            Ok(())
        });
    }
}

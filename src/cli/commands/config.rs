//! Config Command
//!
//! Usage:
//!   codetutor config show [--json]
//!   codetutor config path
//!   codetutor config init [--global] [--force]

use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::tutorial::derive_project_name;
use crate::types::Result;

/// Print the merged effective configuration
pub fn show(as_json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    println!("{}", ConfigLoader::render(&config, as_json)?);
    Ok(())
}

/// Print configuration file locations
pub fn path() -> Result<()> {
    let output = Output::new();
    output.section("Configuration files");
    for (label, path, exists) in ConfigLoader::describe_paths() {
        let shown = match path {
            Some(path) if exists => path.display().to_string(),
            Some(path) => format!("{} (not found)", path.display()),
            None => "(unavailable)".to_string(),
        };
        output.field(label, shown);
    }
    Ok(())
}

pub fn init(global: bool, force: bool) -> Result<()> {
    let output = Output::new();

    if global {
        let path = ConfigLoader::init_global(force)?;
        output.success("Initialized global configuration");
        output.field("Config", path.display());
        return Ok(());
    }

    let root = std::env::current_dir()?;
    let project_name = derive_project_name(&root);
    let path = ConfigLoader::init_project(Some(&project_name), force)?;
    output.success("Initialized project configuration");
    output.field("Config", path.display());
    Ok(())
}

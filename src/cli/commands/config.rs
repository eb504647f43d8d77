//! Config Command
//!
//! Manage seoplan configuration.
//!
//! Usage:
//!   seoplan config show [-g] [-f toml|json|yaml]
//!   seoplan config path
//!   seoplan config init [-g] [--force]

use crate::config::ConfigLoader;
use crate::types::Result;

/// Show configuration
pub fn show(global: bool, format: &str) -> Result<()> {
    if global {
        match ConfigLoader::global_config_path() {
            Some(global_path) if global_path.exists() => {
                let config = ConfigLoader::load_from_file(&global_path)?;
                println!("# Global Config: {}\n", global_path.display());
                println!("{}", ConfigLoader::render(&config, format)?);
            }
            Some(_) => {
                println!("No global config found.");
                println!("Run 'seoplan config init --global' to create one.");
            }
            None => println!("Cannot determine global config directory."),
        }
    } else {
        // Merged effective config; the API key is never rendered
        let config = ConfigLoader::load()?;
        println!("{}", ConfigLoader::render(&config, format)?);
    }
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Initialize global configuration
pub fn init_global(force: bool) -> Result<()> {
    let config_path = ConfigLoader::init_global(force)?;
    println!("✓ Initialized global configuration");
    println!("  Config: {}", config_path.display());
    Ok(())
}

/// Initialize project configuration in the current directory
pub fn init_project(force: bool) -> Result<()> {
    let root = std::env::current_dir()?;
    let config_path = ConfigLoader::init_project(&root, force)?;
    println!("✓ Initialized project configuration");
    println!("  Config:  {}", config_path.display());
    println!(
        "  Reports: {}",
        root.join(ConfigLoader::project_dir()).join("reports").display()
    );
    Ok(())
}

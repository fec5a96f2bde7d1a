use std::path::Path;

use anyhow::Result;

use readaloud_core::AppConfig;

pub fn run(config: &AppConfig, path: &Path, init: bool) -> Result<()> {
    if init {
        if path.exists() {
            println!("Configuration already exists: {}", path.display());
        } else {
            AppConfig::default().save_to(path)?;
            println!("Wrote default configuration: {}", path.display());
        }
    } else {
        println!("Configuration file: {}", path.display());
    }

    println!("Log file: {}", config.log_path().display());
    println!();
    print!("{}", config.to_toml()?);

    Ok(())
}

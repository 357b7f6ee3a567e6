use anyhow::{Context, Result};
use roomcraft_infrastructure::{ConfigService, RoomcraftPaths};
use std::path::Path;

pub fn init_secret(config_dir: Option<&Path>) -> Result<()> {
    let path = RoomcraftPaths::new(config_dir)
        .ensure_secret_file()
        .context("Failed to create secret.json")?;

    println!("Secret file: {}", path.display());
    println!("Add your Gemini API key under \"gemini.api_key\" before rendering.");
    Ok(())
}

pub fn print_config(config_dir: Option<&Path>) -> Result<()> {
    let service = ConfigService::new(config_dir);
    let path = service.config_path()?;
    let config = service.get_config()?;

    println!("# {}", path.display());
    print!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to serialize configuration")?
    );
    Ok(())
}

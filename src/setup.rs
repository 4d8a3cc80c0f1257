use crate::config::{Config, CONFIG_FILE, ENV_MODEL_TOKEN};
use anyhow::Result;
use inquire::Password;
use std::path::Path;

/// First-run setup: asks for the model token when neither the environment
/// nor `config.yml` provides one, and saves it to `config.yml`.
pub fn run_setup(config: &mut Config) -> Result<()> {
    if config.model_token().is_some() {
        return Ok(());
    }

    println!(
        "No model token found ({} or model_token in {}).",
        ENV_MODEL_TOKEN, CONFIG_FILE
    );
    let token = Password::new("Model token:")
        .without_confirmation()
        .with_help_message("Saved to config.yml. Leave empty to abort.")
        .prompt()?;
    let token = token.trim().to_string();
    if token.is_empty() {
        return Ok(());
    }

    // Only the token is persisted; environment overrides stay out of the file.
    let path = Path::new(CONFIG_FILE);
    let mut file_config = Config::load_from(path)?;
    file_config.model_token = Some(token.clone());
    file_config.save_to(path)?;
    println!("Configuration saved.");

    config.model_token = Some(token);
    Ok(())
}

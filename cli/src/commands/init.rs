//! Starter configuration
use std::path::{Path, PathBuf};

use crate::commands::cli::InitArgs;
use tagflow_core::api as core_api;

/// Handle init command. Returns the path of the config file.
pub fn handle_init(
    args: InitArgs,
    global_config: Option<&Path>,
) -> Result<PathBuf, core_api::CliError> {
    let config_path = match args.path.as_deref().or(global_config) {
        Some(p) => p.to_path_buf(),
        None => core_api::get_tagflow_data_dir()?.join(core_api::CONFIG_FILE_NAME),
    };

    if config_path.exists() && !args.force {
        println!(
            "Configuration file already exists at: {}",
            config_path.display()
        );
        println!("Edit it directly, or run init again with --force to overwrite.");
        return Ok(config_path);
    }

    core_api::save_to_path(&starter_config(), &config_path)?;

    println!("### Configuration Created\n");
    println!("File: {}", config_path.display());
    println!();
    println!("Fill in an api_key (or export GEMINI_API_KEY), then:");
    println!("  tagflow models                 # check the endpoints");
    println!("  tagflow run ./images --out ./dataset");
    println!();

    Ok(config_path)
}

/// Defaults plus one Gemini endpoint and one disabled OpenAI-compatible one.
fn starter_config() -> core_api::AppConfig {
    let mut cfg = core_api::AppConfig::default();

    let mut gemini = core_api::Endpoint::new(
        "gemini",
        core_api::EndpointKind::Gemini,
        "",
        "gemini-2.0-flash-exp",
    );
    gemini.name = "Gemini".to_string();

    let mut openai =
        core_api::Endpoint::new("openai", core_api::EndpointKind::Openai, "", "gpt-4o-mini");
    openai.name = "OpenAI compatible".to_string();
    openai.base_url = Some(core_api::DEFAULT_OPENAI_BASE_URL.to_string());
    openai.disabled = true;

    cfg.run.endpoints = vec![gemini, openai];
    cfg
}

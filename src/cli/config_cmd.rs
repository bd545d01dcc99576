use anyhow::{Context, Result};

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::core::auth::SESSION_KEY_ENV;
use crate::core::config::AppConfig;

pub fn init(_opts: &OutputOptions) -> Result<()> {
    let path = AppConfig::config_path();
    if path.exists() {
        eprintln!("Config file already exists at {}", path.display());
        eprintln!("Remove it first if you want to regenerate.");
        return Ok(());
    }

    AppConfig::default()
        .save_to(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Generated config at {}", path.display());
    println!(
        "  Set api.session_key there or export {} before running `pacebadge watch`.",
        SESSION_KEY_ENV
    );
    Ok(())
}

pub fn check(_opts: &OutputOptions) -> Result<()> {
    let path = AppConfig::config_path();
    if !path.exists() {
        eprintln!("No config file found at {}", path.display());
        eprintln!("Run `pacebadge config init` to create one.");
        return Ok(());
    }

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let issues = config.validate();
    if issues.is_empty() {
        println!("Config is valid: {}", path.display());
        println!(
            "  Fetch every {}s, rotate every {}s",
            config.polling.fetch_interval_secs, config.polling.rotate_interval_secs
        );
        let has_key = config.api.session_key.is_some() || std::env::var(SESSION_KEY_ENV).is_ok();
        if !has_key {
            println!("  No session key configured.");
        }
    } else {
        eprintln!("Config issues found in {}:", path.display());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
        std::process::exit(1);
    }
    Ok(())
}

/// Print the effective configuration, with the session key masked.
pub fn show(config: &AppConfig, opts: &OutputOptions) -> Result<()> {
    let mut shown = config.clone();
    if shown.api.session_key.is_some() {
        shown.api.session_key = Some("********".to_string());
    }
    match opts.format {
        OutputFormat::Text => {
            let text = toml::to_string_pretty(&shown).context("Failed to serialize config")?;
            println!("# {}", AppConfig::config_path().display());
            print!("{}", text);
        }
        OutputFormat::Json => println!("{}", opts.to_json(&shown)?),
    }
    Ok(())
}

use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use cityweather_core::{Config, LookupController, LookupPhase, provider_from_config};
use inquire::Password;

use crate::{render, session};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "cityweather",
    version,
    about = "Current weather by city, with session favorites"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name, e.g. "London".
        city: String,

        /// Print the raw snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive lookups with a favorites list kept for the session.
    Session,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, json } => show(&city, json).await,
            Command::Session => {
                let config = Config::load()?;
                let controller = controller_from_config(&config)?;
                session::run(&config, controller).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key.trim().to_string());
    config.api_key()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let controller = controller_from_config(&config)?;

    let state = controller.lookup(city).await;
    if state.phase != LookupPhase::Success {
        let message = state
            .error
            .map(|err| err.message())
            .unwrap_or_else(|| "Lookup did not complete".to_string());
        return Err(anyhow!(message));
    }

    if json {
        let text = serde_json::to_string_pretty(&state.result)
            .context("Failed to serialize weather snapshot")?;
        println!("{text}");
    } else {
        println!("{}", render::lookup(&controller.view(&config.icon_base_url), &state.result));
    }

    Ok(())
}

fn controller_from_config(config: &Config) -> anyhow::Result<LookupController> {
    let provider = provider_from_config(config)?;
    let controller = LookupController::new(Arc::from(provider), config.lookup_delay());
    tracing::debug!(
        base_url = %config.base_url,
        delay = ?controller.delay(),
        "created lookup controller"
    );
    Ok(controller)
}

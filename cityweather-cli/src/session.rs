//! Interactive lookup session.
//!
//! The favorites store is created here and handed to every command that
//! needs it; it lives until the session ends.

use anyhow::Context;
use cityweather_core::{CardView, Config, FavoritesStore, LookupController, Submission};
use inquire::{InquireError, Text};

use crate::render;

const HELP: &str = "\
Type a city name to look it up, or one of:
  :add           save the current result to favorites
  :remove <id>   remove every favorite with this id
  :favorites     list favorites
  :help          show this help
  :quit          leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Search(String),
    Add,
    Remove(i64),
    Favorites,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix(':') else {
        // Blank input is a search too; the controller rejects it.
        return Ok(Input::Search(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("add"), None) => Ok(Input::Add),
        (Some("remove"), Some(id)) => id
            .parse()
            .map(Input::Remove)
            .map_err(|_| format!("'{id}' is not a favorite id")),
        (Some("favorites"), None) => Ok(Input::Favorites),
        (Some("help"), None) => Ok(Input::Help),
        (Some("quit"), None) => Ok(Input::Quit),
        _ => Err(format!("Unknown command '{trimmed}'. Type :help for commands.")),
    }
}

pub async fn run(config: &Config, controller: LookupController) -> anyhow::Result<()> {
    let favorites = FavoritesStore::new();
    println!("{HELP}");

    loop {
        let line = match Text::new("city>").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("Failed to read input"),
        };

        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match input {
            Input::Search(city) => search(config, &controller, &favorites, &city).await,
            Input::Add => {
                if controller.save_current(&favorites) {
                    println!("Saved. {} favorite(s).", favorites.len());
                } else {
                    println!("Nothing to save; look up a city first.");
                }
            }
            Input::Remove(id) => {
                let removed = favorites.remove(id);
                println!("Removed {removed} favorite(s).");
            }
            Input::Favorites => list_favorites(config, &favorites),
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
        }
    }

    Ok(())
}

async fn search(
    config: &Config,
    controller: &LookupController,
    favorites: &FavoritesStore,
    city: &str,
) {
    let submission = controller.submit(city);
    if let Submission::Pending(task) = &submission {
        tracing::debug!(attempt = task.attempt(), city, "lookup pending");
        let view = controller.view(&config.icon_base_url);
        println!("{}", render::lookup(&view, &controller.state().result));
    }
    submission.finished().await;

    let state = controller.state();
    let view = controller.view(&config.icon_base_url);
    println!("{}", render::lookup(&view, &state.result));
    if !state.result.is_empty() && favorites.contains(state.result.id) {
        println!("  (in favorites)");
    }
}

fn list_favorites(config: &Config, favorites: &FavoritesStore) {
    let entries = favorites.list();
    if entries.is_empty() {
        println!("No favorites yet.");
        return;
    }

    for snapshot in &entries {
        println!("{}", render::card(&CardView::new(snapshot, &config.icon_base_url)));
    }
}

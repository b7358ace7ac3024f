//! # rankpair binary
//!
//! Assembles the engine (JSON store + ranking service) and drives it from
//! a line-oriented REPL. All text formatting lives here; the engine only
//! returns values. A chat transport would replace this module and call
//! the same service methods.

mod config;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rp_core::error::RankError;
use rp_service::{EngineConfig, PairOffer, RankingService};
use rp_storage_json::JsonStore;

use crate::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    info!(data_dir = %settings.data_dir.display(), judge = %settings.judge_id, "starting");

    let store = JsonStore::open(&settings.data_dir).await?;
    let service = RankingService::new(
        store,
        EngineConfig {
            k_factor: settings.k_factor,
            candidate_window: settings.candidate_window,
        },
    );

    run_repl(&service, &settings.judge_id).await
}

async fn run_repl(service: &RankingService<JsonStore>, judge_id: &str) -> anyhow::Result<()> {
    println!("rankpair: type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));

        match (verb, rest.trim()) {
            ("help", _) => print_help(),
            ("add", "") => println!("usage: add <name>"),
            ("add", name) => match service.add_item(name, Some(judge_id.to_string())).await {
                Ok((item, true)) => println!("Added '{}' to the ranking list.", item.name),
                Ok((item, false)) => println!("'{}' is already in the list.", item.name),
                Err(err) => print_error(&err),
            },
            ("rank", _) => match service.request_pair(judge_id).await {
                Ok(offer) => print_offer(&offer),
                Err(err) => print_error(&err),
            },
            ("1" | "2", _) => match service.submit_choice(judge_id, verb).await {
                Ok(outcome) => {
                    println!(
                        "Recorded your preference for '{}' ({:.0} vs {:.0}).",
                        outcome.winner.name, outcome.winner.rating, outcome.loser.rating
                    );
                    match service.request_pair(judge_id).await {
                        Ok(offer) => print_offer(&offer),
                        Err(err) => print_error(&err),
                    }
                }
                Err(err) => print_error(&err),
            },
            ("skip", _) => match service.skip_current_offer(judge_id).await {
                Ok(offer) => print_offer(&offer),
                Err(err) => print_error(&err),
            },
            ("reveal", _) => match service.leaderboard().await {
                Ok(items) if items.is_empty() => {
                    println!("No items to rank yet. Add some with `add <name>`.")
                }
                Ok(items) => {
                    println!("Current rankings:");
                    for (place, item) in items.iter().enumerate() {
                        println!(
                            "{:>3}. {} (rating: {:.0}, comparisons: {})",
                            place + 1,
                            item.name,
                            item.rating,
                            item.comparison_count
                        );
                    }
                }
                Err(err) => print_error(&err),
            },
            ("remaining", _) => match service.remaining_pairs(judge_id).await {
                Ok(n) => println!("{n} pair(s) left for you."),
                Err(err) => print_error(&err),
            },
            ("duel", _) => match service.random_pair().await {
                Ok((a, b)) => println!("Random match-up: {} vs {}", a.name, b.name),
                Err(err) => print_error(&err),
            },
            ("rerank", _) => match service.reset_rankings().await {
                Ok(()) => println!("Rankings reset. All votes cleared, but items remain."),
                Err(err) => print_error(&err),
            },
            ("reset", "all") => match service.reset_all().await {
                Ok(()) => println!("Reset complete. All items, votes, and rankings cleared."),
                Err(err) => print_error(&err),
            },
            ("quit" | "exit", _) => break,
            _ => println!("Unknown command. Type `help`."),
        }
    }

    Ok(())
}

fn print_offer(offer: &PairOffer) {
    println!("Which do you prefer?");
    println!("  1. {}", offer.item_a.name);
    println!("  2. {}", offer.item_b.name);
    println!(
        "Reply with 1 or 2. ({} pair{} remaining)",
        offer.remaining,
        if offer.remaining == 1 { "" } else { "s" }
    );
}

fn print_error(err: &RankError) {
    match err {
        RankError::InsufficientItems(_) => {
            println!("Not enough items to compare yet. Add at least 2 with `add <name>`.")
        }
        RankError::PairsExhausted => {
            println!("You've voted on every pair. Check the rankings with `reveal`.")
        }
        RankError::InvalidChoice(_) => println!("Please reply with 1 or 2."),
        RankError::NotFound(kind, _) if kind == "voting session" => {
            println!("No pair is waiting for you. Type `rank` to get one.")
        }
        RankError::NotFound(..) => println!("That item no longer exists. Starting over: `rank`."),
        RankError::Storage(source) => println!("Storage error: {source:#}"),
    }
}

fn print_help() {
    println!(
        "\
commands:
  add <name>   add an item to rank (idempotent by name)
  rank         get your next pair to judge
  1 | 2        choose the preferred item of the current pair
  skip         discard the current pair and draw another
  reveal       show the leaderboard
  remaining    how many pairs you still have
  duel         show a random match-up (ignores history)
  rerank       reset ratings and votes, keep items
  reset all    wipe everything
  quit         leave"
    );
}

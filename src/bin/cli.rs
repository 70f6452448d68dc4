use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use safepick::api::espn_api::GameWindow;
use safepick::config::AppConfig;
use safepick::data::save_predictions_to_csv;
use safepick::{init_tracing, AppState};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "safepick", about = "Football prediction grading and maintenance")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grade pending predictions against final scores
    Grade {
        /// Keep running, grading every SECS seconds
        #[arg(long, value_name = "SECS")]
        every: Option<u64>,
    },
    /// List games from the scoreboard feed
    Games {
        #[arg(long, default_value = "all")]
        league: String,
        /// Finished games from the last 30 days instead of upcoming ones
        #[arg(long)]
        past: bool,
        /// Explicit date range, e.g. 20250101-20250107
        #[arg(long)]
        dates: Option<String>,
    },
    /// Print site statistics
    Stats,
    /// Export recent predictions to CSV
    Export {
        #[arg(long)]
        out: String,
        #[arg(long, default_value_t = 1000)]
        limit: i64,
    },
    /// Delete every prediction and zero the counters
    Reset {
        /// Required to confirm the reset
        #[arg(long)]
        yes: bool,
    },
    /// Check the prediction model is reachable
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let state = AppState::build(config)
        .await
        .context("Failed to initialise application state")?;

    match cli.command {
        Command::Grade { every: None } => {
            let summary = state.grader.run_pass().await?;
            println!(
                "Examined {} predictions: {} graded, {} skipped, {} failed",
                summary.examined, summary.graded, summary.skipped, summary.failed
            );
        }
        Command::Grade {
            every: Some(seconds),
        } => {
            let mut interval = tokio::time::interval(Duration::from_secs(seconds.max(1)));
            loop {
                interval.tick().await;
                // A failed pass is retried on the next tick
                match state.grader.run_pass().await {
                    Ok(summary) => tracing::info!(
                        examined = summary.examined,
                        graded = summary.graded,
                        "Grading pass finished"
                    ),
                    Err(e) => tracing::error!("Grading pass failed: {e:#}"),
                }
            }
        }
        Command::Games {
            league,
            past,
            dates,
        } => {
            let window = if past {
                GameWindow::Past
            } else {
                GameWindow::Upcoming
            };
            let games = state
                .espn
                .fetch_games(&league, window, dates.as_deref())
                .await;

            println!("{} games\n", games.len());
            for game in &games {
                println!(
                    "{:<10} {:<22} {:<25} {:>3} - {:<3} {:<25} [{}]",
                    game.id,
                    game.date,
                    game.home_team.name,
                    game.home_team.score,
                    game.away_team.score,
                    game.away_team.name,
                    game.status_detail
                );
            }
        }
        Command::Stats => {
            let stats = state.store.get_stats().await?;
            println!("Visits:      {}", stats.total_visits);
            println!("Predictions: {}", stats.total_predictions);
            println!("Graded:      {}", stats.total_graded);
            println!("Win rate:    {}%", stats.win_rate);
        }
        Command::Export { out, limit } => {
            let predictions = state.store.get_recent_predictions(limit).await?;
            save_predictions_to_csv(&predictions, &out)?;
            println!("Saved {} predictions to {}", predictions.len(), out);
        }
        Command::Reset { yes } => {
            if !yes {
                anyhow::bail!("Refusing to reset without --yes");
            }
            state.store.reset().await?;
            println!("All predictions deleted and counters reset");
        }
        Command::Ping => {
            let reply = state
                .generator
                .ping()
                .await
                .context("Prediction model unreachable")?;
            println!("{}", reply.trim());
        }
    }

    Ok(())
}

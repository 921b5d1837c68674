use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::application::config::EngineConfig;
use crate::presentation::bootstrap::{build_app_state, build_fcm_transport, open_database};
use crate::presentation::error::ApiError;
use crate::presentation::state::AppState;
use microjournal_domain::activity::NewActivity;
use microjournal_domain::clock::SystemClock;
use microjournal_domain::shared::UserId;

#[derive(Parser, Debug)]
#[command(name = "microjournal", version, about = "Micro-journal streak engine")]
pub struct Cli {
    /// JSON config file; defaults apply when omitted
    #[arg(long, env = "MICROJOURNAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Overrides `database_path` from the config file
    #[arg(long, env = "MICROJOURNAL_DATABASE")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply migrations and record the cutoff hour
    Migrate,
    /// Run one daily reminder scan
    DailyReminder,
    /// Run one streak expiry scan
    StreakReminder,
    /// Run both scans on their cron schedules until Ctrl-C
    Scheduler,
    /// Post today's activity for a user
    Post {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        text: String,
        #[arg(long)]
        template: Option<i64>,
        #[arg(long)]
        photo: Option<String>,
    },
    /// Register a device token for a user
    RegisterToken {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        token: String,
    },
    /// Show a user's pair streaks
    PairStreaks {
        #[arg(long)]
        user: i64,
    },
}

impl Cli {
    pub fn load_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = EngineConfig::load(self.config.as_deref())?;
        if let Some(path) = &self.database {
            config = config.with_database_path(path);
        }
        Ok(config)
    }
}

pub async fn run(cli: Cli, config: EngineConfig) -> anyhow::Result<()> {
    let db = open_database(&config).await?;
    if matches!(cli.command, Command::Migrate) {
        db.close().await;
        info!("✅ Migrations applied");
        return Ok(());
    }

    let transport = build_fcm_transport(&config)?;
    let state = build_app_state(config, db, transport, Arc::new(SystemClock));
    let result = execute(&state, cli.command).await;
    state.shutdown().await;
    result
}

async fn execute(state: &AppState, command: Command) -> anyhow::Result<()> {
    let services = &state.services;
    match command {
        Command::Migrate => {}
        Command::DailyReminder => {
            let report = services.scanner.run_daily_reminder_scan().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::StreakReminder => {
            let report = services.scanner.run_streak_expiry_scan().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Scheduler => {
            services.scheduler.start().await?;
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            info!("Received Ctrl-C, stopping");
        }
        Command::Post {
            user,
            text,
            template,
            photo,
        } => {
            let mut payload = NewActivity::new(text);
            if let Some(template) = template {
                payload = payload.with_template(template);
            }
            if let Some(photo) = photo {
                payload = payload.with_photo(photo);
            }

            let created = services
                .activity
                .create_activity(UserId::new(user), payload)
                .await
                .map_err(ApiError::from)?;
            let delivery = match created.notification {
                Some(ticket) => Some(ticket.wait().await.map_err(ApiError::from)?),
                None => None,
            };
            let body = json!({
                "activity": created.activity,
                "streak": created.streak,
                "notified": delivery,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::RegisterToken { user, token } => {
            let endpoint = services
                .activity
                .register_endpoint(UserId::new(user), &token)
                .await
                .map_err(ApiError::from)?;
            println!("{}", serde_json::to_string_pretty(&endpoint)?);
        }
        Command::PairStreaks { user } => {
            let views = services
                .activity
                .pair_streaks(UserId::new(user))
                .await
                .map_err(ApiError::from)?;
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
    }
    Ok(())
}

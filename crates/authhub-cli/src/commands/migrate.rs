//! Database migration commands.

use clap::{Args, Subcommand};

use authhub_core::config::{AppConfig, DatabaseBackend};
use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_database::DatabasePool;

use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Apply all pending migrations
    Run,
}

/// Execute migration commands.
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> AppResult<()> {
    if config.database.backend != DatabaseBackend::Postgres {
        return Err(AppError::configuration(
            "Migrations apply to the postgres backend only",
        ));
    }

    match &args.command {
        MigrateCommand::Run => {
            let pool = DatabasePool::connect(&config.database).await?;
            println!("Running database migrations...");
            authhub_database::migration::run_migrations(pool.pool()).await?;
            pool.close().await;
            output::print_success("All migrations applied.");
        }
    }
    Ok(())
}

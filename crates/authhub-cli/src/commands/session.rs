//! Refresh session maintenance.

use clap::{Args, Subcommand};

use authhub_auth::session::SessionCleanup;
use authhub_core::result::AppResult;

use super::Context;
use crate::output;

/// Arguments for session commands
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Session subcommand
    #[command(subcommand)]
    pub command: SessionCommand,
}

/// Session subcommands
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Delete revoked and expired refresh sessions now
    Sweep,
}

/// Execute session commands.
pub async fn execute(args: &SessionArgs, ctx: &Context) -> AppResult<()> {
    match &args.command {
        SessionCommand::Sweep => {
            let deleted = SessionCleanup::new(ctx.store.sessions.clone())
                .run_cleanup()
                .await?;
            output::print_success(&format!("Deleted {} dead refresh sessions", deleted));
        }
    }
    Ok(())
}

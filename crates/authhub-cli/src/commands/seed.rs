//! Platform bootstrap.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_service::SeedRequest;

use super::Context;
use crate::output::{self, OutputFormat};

/// Arguments for the seed command
#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Display name of the platform tenant
    #[arg(long, default_value = "Platform")]
    pub tenant_name: String,

    /// Subdomain of the platform tenant
    #[arg(long, default_value = "platform")]
    pub subdomain: String,

    /// Email of the first super-administrator
    #[arg(long)]
    pub admin_email: String,

    /// Password of the first super-administrator; prompted when omitted
    #[arg(long, env = "AUTHHUB_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct SeedRow {
    record: &'static str,
    id: String,
    detail: String,
}

/// Runs the idempotent bootstrap.
pub async fn execute(args: &SeedArgs, ctx: &Context, format: OutputFormat) -> AppResult<()> {
    let admin_password = match &args.admin_password {
        Some(password) => password.clone(),
        None => prompt_password()?,
    };

    let outcome = ctx
        .tenancy
        .seed(&SeedRequest {
            tenant_name: args.tenant_name.clone(),
            tenant_subdomain: args.subdomain.clone(),
            admin_email: args.admin_email.clone(),
            admin_password,
        })
        .await?;
    ctx.notifier.flush().await;

    let mut rows = vec![
        SeedRow {
            record: "plan",
            id: outcome.plan.id.to_string(),
            detail: outcome.plan.name.clone(),
        },
        SeedRow {
            record: "tenant",
            id: outcome.tenant.id.to_string(),
            detail: outcome.tenant.subdomain.clone(),
        },
        SeedRow {
            record: "subscription",
            id: outcome.subscription.id.to_string(),
            detail: format!("expires {}", outcome.subscription.expires_at.format("%Y-%m-%d")),
        },
    ];
    if let Some(admin) = &outcome.admin {
        rows.push(SeedRow {
            record: "superadmin",
            id: admin.id.to_string(),
            detail: admin.email.clone(),
        });
    }
    output::print_list(&rows, format);

    if outcome.admin.is_none() {
        output::print_warning(&format!(
            "Account {} already exists; left unchanged",
            args.admin_email
        ));
    }
    output::print_success("Seed complete");
    Ok(())
}

/// Prompts for a new password twice.
pub fn prompt_password() -> AppResult<String> {
    dialoguer::Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {}", e)))
}

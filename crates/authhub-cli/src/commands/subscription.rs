//! Subscription management commands.

use chrono::{Duration, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_entity::subscription::{Subscription, SubscriptionStatus};

use super::Context;
use crate::output::{self, OutputFormat};

/// Arguments for subscription commands
#[derive(Debug, Args)]
pub struct SubscriptionArgs {
    /// Subscription subcommand
    #[command(subcommand)]
    pub command: SubscriptionCommand,
}

/// Subscription subcommands
#[derive(Debug, Subcommand)]
pub enum SubscriptionCommand {
    /// Open an ACTIVE subscription; fails if the tenant already has one
    Create {
        /// Tenant subdomain
        #[arg(long)]
        tenant: String,
        /// Plan name
        #[arg(long)]
        plan: String,
        /// Lifetime in days
        #[arg(long, default_value_t = 365)]
        days: i64,
    },
    /// List a tenant's subscriptions
    List {
        /// Tenant subdomain
        #[arg(long)]
        tenant: String,
    },
    /// Terminate a subscription
    Cancel {
        /// Subscription ID
        id: Uuid,
    },
    /// Temporarily disable a subscription
    Suspend {
        /// Subscription ID
        id: Uuid,
    },
}

/// Subscription display row.
#[derive(Debug, Serialize, Tabled)]
pub struct SubscriptionRow {
    id: String,
    tenant_id: String,
    status: String,
    started_at: String,
    expires_at: String,
}

impl From<&Subscription> for SubscriptionRow {
    fn from(s: &Subscription) -> Self {
        Self {
            id: s.id.to_string(),
            tenant_id: s.tenant_id.to_string(),
            status: s.status.to_string(),
            started_at: s.started_at.format("%Y-%m-%d").to_string(),
            expires_at: s.expires_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Execute subscription commands.
pub async fn execute(
    args: &SubscriptionArgs,
    ctx: &Context,
    format: OutputFormat,
) -> AppResult<()> {
    match &args.command {
        SubscriptionCommand::Create { tenant, plan, days } => {
            if *days <= 0 {
                return Err(AppError::validation("--days must be positive"));
            }
            let tenant = ctx.tenancy.find_tenant(tenant).await?;
            let subscription = ctx
                .tenancy
                .create_subscription(tenant.id, plan, Utc::now() + Duration::days(*days))
                .await?;
            output::print_item(&SubscriptionRow::from(&subscription), format);
            output::print_success("Subscription created");
        }
        SubscriptionCommand::List { tenant } => {
            let tenant = ctx.tenancy.find_tenant(tenant).await?;
            let rows: Vec<SubscriptionRow> = ctx
                .tenancy
                .list_subscriptions(tenant.id)
                .await?
                .iter()
                .map(SubscriptionRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        SubscriptionCommand::Cancel { id } => {
            ctx.tenancy
                .set_subscription_status(*id, SubscriptionStatus::Cancelled)
                .await?;
            output::print_success(&format!("Subscription {} cancelled", id));
        }
        SubscriptionCommand::Suspend { id } => {
            ctx.tenancy
                .set_subscription_status(*id, SubscriptionStatus::Suspended)
                .await?;
            output::print_success(&format!("Subscription {} suspended", id));
        }
    }
    Ok(())
}

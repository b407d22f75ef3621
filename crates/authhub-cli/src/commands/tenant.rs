//! Tenant management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use authhub_core::result::AppResult;
use authhub_entity::tenant::{PlanTier, Tenant};

use super::Context;
use crate::output::{self, OutputFormat};

/// Arguments for tenant commands
#[derive(Debug, Args)]
pub struct TenantArgs {
    /// Tenant subcommand
    #[command(subcommand)]
    pub command: TenantCommand,
}

/// Tenant subcommands
#[derive(Debug, Subcommand)]
pub enum TenantCommand {
    /// Create a tenant
    Create {
        /// Display name
        #[arg(long)]
        name: String,
        /// Unique subdomain label
        #[arg(long)]
        subdomain: String,
        /// Plan tier (FREE, START, PRO, ENTERPRISE)
        #[arg(long, default_value = "FREE")]
        plan: PlanTier,
    },
    /// Show a tenant
    Show {
        /// Subdomain
        subdomain: String,
    },
    /// Re-enable logins for a tenant's accounts
    Enable {
        /// Subdomain
        subdomain: String,
    },
    /// Block logins and refreshes for a tenant's accounts
    Disable {
        /// Subdomain
        subdomain: String,
    },
}

/// Tenant display row.
#[derive(Debug, Serialize, Tabled)]
pub struct TenantRow {
    id: String,
    name: String,
    subdomain: String,
    plan: String,
    active: bool,
    created_at: String,
}

impl From<&Tenant> for TenantRow {
    fn from(t: &Tenant) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.name.clone(),
            subdomain: t.subdomain.clone(),
            plan: t.plan.to_string(),
            active: t.active,
            created_at: t.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute tenant commands.
pub async fn execute(args: &TenantArgs, ctx: &Context, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        TenantCommand::Create {
            name,
            subdomain,
            plan,
        } => {
            let tenant = ctx.tenancy.create_tenant(name, subdomain, *plan).await?;
            output::print_item(&TenantRow::from(&tenant), format);
            output::print_success(&format!("Tenant '{}' created", tenant.subdomain));
        }
        TenantCommand::Show { subdomain } => {
            let tenant = ctx.tenancy.find_tenant(subdomain).await?;
            output::print_item(&TenantRow::from(&tenant), format);
        }
        TenantCommand::Enable { subdomain } => {
            let tenant = ctx.tenancy.find_tenant(subdomain).await?;
            ctx.tenancy.set_tenant_active(tenant.id, true).await?;
            output::print_success(&format!("Tenant '{}' enabled", subdomain));
        }
        TenantCommand::Disable { subdomain } => {
            let tenant = ctx.tenancy.find_tenant(subdomain).await?;
            ctx.tenancy.set_tenant_active(tenant.id, false).await?;
            output::print_success(&format!("Tenant '{}' disabled", subdomain));
        }
    }
    Ok(())
}

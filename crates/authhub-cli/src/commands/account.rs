//! Account management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_entity::account::{Account, AccountRole};
use authhub_service::CreateAccountRequest;

use super::Context;
use super::seed::prompt_password;
use crate::output::{self, OutputFormat};

/// Arguments for account commands
#[derive(Debug, Args)]
pub struct AccountArgs {
    /// Account subcommand
    #[command(subcommand)]
    pub command: AccountCommand,
}

/// Account subcommands
#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Create an account. ADMIN and USER accounts start inactive and are
    /// sent an email verification link.
    Create {
        /// Email address
        #[arg(long)]
        email: String,
        /// Role (SUPERADMIN, ADMIN, USER)
        #[arg(long, default_value = "USER")]
        role: AccountRole,
        /// Owning tenant subdomain; required unless SUPERADMIN
        #[arg(long)]
        tenant: Option<String>,
        /// Initial password; prompted when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Re-enable an account
    Enable {
        /// Account ID
        id: Uuid,
    },
    /// Disable an account
    Disable {
        /// Account ID
        id: Uuid,
    },
    /// Invalidate every session of an account
    ForceLogout {
        /// Account ID
        id: Uuid,
    },
}

/// Account display row.
#[derive(Debug, Serialize, Tabled)]
pub struct AccountRow {
    id: String,
    email: String,
    role: String,
    tenant_id: String,
    active: bool,
    verified: bool,
}

impl From<&Account> for AccountRow {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id.to_string(),
            email: a.email.clone(),
            role: a.role.to_string(),
            tenant_id: a.tenant_id.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
            active: a.active,
            verified: a.email_verified_at.is_some(),
        }
    }
}

/// Execute account commands.
pub async fn execute(args: &AccountArgs, ctx: &Context, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        AccountCommand::Create {
            email,
            role,
            tenant,
            password,
        } => {
            let tenant_id = match (role, tenant) {
                (AccountRole::SuperAdmin, Some(_)) => {
                    return Err(AppError::validation(
                        "SUPERADMIN accounts do not belong to a tenant",
                    ));
                }
                (AccountRole::SuperAdmin, None) => None,
                (_, Some(subdomain)) => Some(ctx.tenancy.find_tenant(subdomain).await?.id),
                (_, None) => {
                    return Err(AppError::validation("--tenant is required for this role"));
                }
            };
            let password = match password {
                Some(password) => password.clone(),
                None => prompt_password()?,
            };

            let account = ctx
                .tenancy
                .create_account(&CreateAccountRequest {
                    email: email.clone(),
                    password,
                    role: *role,
                    tenant_id,
                })
                .await?;
            ctx.notifier.flush().await;

            output::print_item(&AccountRow::from(&account), format);
            if account.active {
                output::print_success("Account created");
            } else {
                output::print_success("Account created; verification email sent");
            }
        }
        AccountCommand::Enable { id } => {
            ctx.tenancy.set_account_active(*id, true).await?;
            output::print_success(&format!("Account {} enabled", id));
        }
        AccountCommand::Disable { id } => {
            ctx.tenancy.set_account_active(*id, false).await?;
            output::print_success(&format!("Account {} disabled", id));
        }
        AccountCommand::ForceLogout { id } => {
            let version = ctx.tenancy.force_logout(*id).await?;
            output::print_success(&format!(
                "Sessions of account {} invalidated (token version {})",
                id, version
            ));
        }
    }
    Ok(())
}

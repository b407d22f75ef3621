//! CLI command definitions and dispatch.

pub mod account;
pub mod keygen;
pub mod migrate;
pub mod seed;
pub mod session;
pub mod subscription;
pub mod tenant;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use authhub_auth::jwt::SigningKeys;
use authhub_core::config::AppConfig;
use authhub_core::result::AppResult;
use authhub_database::CredentialStore;
use authhub_service::{AuthEngine, NotificationDispatcher, TenancyService};

use crate::output::OutputFormat;

/// AuthHub: centralized sign-on for tenant applications
#[derive(Debug, Parser)]
#[command(name = "authhub", version, about, long_about = None)]
pub struct Cli {
    /// Explicit configuration file; overrides the environment layering
    #[arg(short, long)]
    pub config: Option<String>,

    /// Configuration environment overlay (config/{env}.toml)
    #[arg(short, long, env = "AUTHHUB_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Bootstrap the platform tenant and first super-administrator
    Seed(seed::SeedArgs),
    /// Generate an RSA signing key pair
    Keygen(keygen::KeygenArgs),
    /// Tenant management
    Tenant(tenant::TenantArgs),
    /// Subscription management
    Subscription(subscription::SubscriptionArgs),
    /// Account management
    Account(account::AccountArgs),
    /// Refresh session maintenance
    Session(session::SessionArgs),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(&self) -> AppResult<()> {
        match &self.command {
            Commands::Keygen(args) => keygen::execute(args),
            Commands::Migrate(args) => migrate::execute(args, &self.load_config()?).await,
            Commands::Seed(args) => seed::execute(args, &self.context().await?, self.format).await,
            Commands::Tenant(args) => tenant::execute(args, &self.context().await?, self.format).await,
            Commands::Subscription(args) => {
                subscription::execute(args, &self.context().await?, self.format).await
            }
            Commands::Account(args) => {
                account::execute(args, &self.context().await?, self.format).await
            }
            Commands::Session(args) => session::execute(args, &self.context().await?).await,
        }
    }

    fn load_config(&self) -> AppResult<AppConfig> {
        match &self.config {
            Some(path) => AppConfig::load_file(path),
            None => AppConfig::load(&self.env),
        }
    }

    async fn context(&self) -> AppResult<Context> {
        Context::open(self.load_config()?).await
    }
}

/// Services shared by the data commands.
pub struct Context {
    /// Credential store.
    pub store: CredentialStore,
    /// Tenancy provisioning.
    pub tenancy: TenancyService,
    /// Outbound notifications; flushed before the process exits.
    pub notifier: NotificationDispatcher,
}

impl Context {
    async fn open(config: AppConfig) -> AppResult<Self> {
        let store = CredentialStore::open(&config.database).await?;
        let keys = Arc::new(SigningKeys::load(&config.auth)?);
        let notifier = NotificationDispatcher::from_config(&config.mail)?;
        let engine = AuthEngine::from_store(&store, keys, notifier.clone(), &config.auth)?;
        let tenancy = TenancyService::new(&store, engine.clone(), engine.hasher().clone(), &config.auth);
        Ok(Self {
            store,
            tenancy,
            notifier,
        })
    }
}

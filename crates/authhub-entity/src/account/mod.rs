//! Account entity and role definitions.

pub mod model;
pub mod role;
pub mod token;

pub use model::{Account, AccountWithTenant, CreateAccount};
pub use role::AccountRole;
pub use token::ActionTokenKind;

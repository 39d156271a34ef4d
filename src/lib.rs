//! Declarative reconciliation of Sentry resources.
//!
//! [`sentry`] is the REST client, [`resource`] holds the typed models, their
//! translators and the Create/Read/Update/Delete/Import orchestration.

pub mod error;
pub mod resource;
pub mod sentry;

pub use error::{ProviderError, Result};

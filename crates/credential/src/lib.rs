//! Credential resolution for workflow nodes.
//!
//! Defines the [`CredentialResolver`] port the engine's worker pool
//! dispatches a node's configured `credential_id` through, plus an
//! in-memory implementation for tests and single-node deployments.
//! At-rest storage, encryption, and rotation are a production deployment's
//! concern, not this crate's.
#![deny(unsafe_code)]
#![forbid(unsafe_code)]

mod description;
mod error;
mod resolver;

pub use crate::description::CredentialDescription;
pub use crate::error::CredentialError;
pub use crate::resolver::{CredentialResolver, InMemoryCredentialResolver, SecretMap};

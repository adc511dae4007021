//! Unified error type for the back office.
//!
//! Core functions return [`Result`] and propagate with `?`; the HTTP layer turns
//! an [`Error`] into a status code and a localized message.

use crate::entities::user::Permission;
use thiserror::Error;

/// All failures the service can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Relational backend failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Local key/value storage failure (demo mode and sessions)
    #[error("Storage error: {message}")]
    Storage {
        /// What went wrong
        message: String,
    },

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem or socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record the caller referenced does not exist in its owner scope
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record ("client", "invoice", ...)
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Input rejected before reaching storage
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// Monetary value that is negative, NaN or infinite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// The acting user lacks a capability
    #[error("Permission denied: {permission}")]
    PermissionDenied {
        /// The missing permission
        permission: Permission,
        /// Localized message shown to the user
        message: String,
    },

    /// Login failed: unknown email, wrong password or inactive account
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No valid session for the request
    #[error("Not authenticated")]
    Unauthenticated,

    /// Operation refused on the default administrator account
    #[error("Protected account: {message}")]
    ProtectedAccount {
        /// Human-readable reason
        message: String,
    },

    /// Argon2 hashing or hash parsing failed
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// What went wrong
        message: String,
    },
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

//! Unified application error model and mapping helpers.
//! This module provides the common error enum used across the HTTP surface and
//! the access-control core, along with the HTTP status mapping. Human-facing
//! message text comes from `crate::messages`; no other module builds
//! user-visible strings out of raw upstream error text.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// No or invalid session.
    Unauthenticated { code: String, message: String },
    /// Valid session, insufficient privilege.
    Forbidden { code: String, message: String },
    NotFound { code: String, message: String },
    /// Uniqueness/constraint violations.
    Conflict { code: String, message: String },
    UserInput { code: String, message: String },
    /// Network/timeout faults that are safe to retry.
    Transient { code: String, message: String },
    Unknown { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Unauthenticated { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::UserInput { code, .. }
            | AppError::Transient { code, .. }
            | AppError::Unknown { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Unauthenticated { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::UserInput { message, .. }
            | AppError::Transient { message, .. }
            | AppError::Unknown { message, .. } => message.as_str(),
        }
    }

    pub fn unauthenticated<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unauthenticated { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn transient<S: Into<String>>(code: S, msg: S) -> Self { AppError::Transient { code: code.into(), message: msg.into() } }
    pub fn unknown<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unknown { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Unauthenticated { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::UserInput { .. } => 400,
            AppError::Transient { .. } => 503,
            AppError::Unknown { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: classify the chain into a human message; the raw
        // text never leaves this boundary.
        AppError::Unknown { code: "unknown".into(), message: crate::messages::friendly_message(&err).to_string() }
    }
}

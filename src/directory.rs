//! Member-directory port.
//!
//! The hosted data store owns membership rows and temporary-admin grants; the
//! core only reads grants and writes the owner role flag through this trait.
//! Grants are mutated by the member-management surface, not here.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// A time-bounded elevation for one member. An absent or past `expires_at` is
/// equivalent to no grant; expiry is compared against the clock at evaluation
/// time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminGrant {
    pub subject_email: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Look up the temporary-admin grant keyed by lower-cased email.
    async fn temporary_admin_grant(&self, email_lower: &str) -> Result<Option<AdminGrant>, DirectoryError>;

    /// Mirror the elevated role label onto the member row.
    async fn set_owner_role_flag(&self, member_id: &str) -> Result<(), DirectoryError>;
}

/// In-memory directory. Grant mutators model the member-management
/// collaborator that owns the grant table.
#[derive(Default)]
pub struct MemoryDirectory {
    grants: RwLock<HashMap<String, AdminGrant>>,
    role_flags: RwLock<HashMap<String, String>>,
}

impl MemoryDirectory {
    pub fn new() -> Self { Self::default() }

    pub fn put_admin_grant(&self, email: &str, expires_at: Option<DateTime<Utc>>) {
        let key = email.to_lowercase();
        let grant = AdminGrant { subject_email: email.to_string(), expires_at };
        self.grants.write().insert(key, grant);
    }

    pub fn clear_admin_grant(&self, email: &str) {
        self.grants.write().remove(&email.to_lowercase());
    }

    pub fn role_flag(&self, member_id: &str) -> Option<String> {
        self.role_flags.read().get(member_id).cloned()
    }
}

#[async_trait]
impl MemberDirectory for MemoryDirectory {
    async fn temporary_admin_grant(&self, email_lower: &str) -> Result<Option<AdminGrant>, DirectoryError> {
        Ok(self.grants.read().get(email_lower).cloned())
    }

    async fn set_owner_role_flag(&self, member_id: &str) -> Result<(), DirectoryError> {
        self.role_flags.write().insert(member_id.to_string(), "owner".to_string());
        Ok(())
    }
}

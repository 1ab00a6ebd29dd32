//! # Session
//!
//! Execution-scoped session state for Marquee pages.
//!
//! ## Philosophy
//!
//! - **Session state is explicit and contextual, not global**
//! - **Populated at login, cleared at logout; nothing else mutates it**
//! - **Read-mostly**: consumers take `&SessionContext`, never a handle
//!   they could write through
//! - **Testability first; no hidden shared cache**
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - Authentication or token handling
//! - Persistence of any kind
//! - An authorization mechanism

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a UserId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Attributes of the signed-in user
///
/// Immutable after construction; a new login builds a new context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Unique user identifier
    pub user_id: UserId,
    /// Account handle on the external service
    pub handle: String,
    /// Display name shown on the page
    pub display_name: String,
    /// Contact email (if shared)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Two-letter country code (if shared)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Follower count at login time
    pub follower_count: u32,
    /// Avatar image URL (if the account has one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Subscription plan name (if shared)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

impl SessionContext {
    /// Creates a context with the required attributes
    pub fn new(user_id: UserId, handle: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            handle: handle.into(),
            display_name: display_name.into(),
            email: None,
            country: None,
            follower_count: 0,
            avatar_url: None,
            plan: None,
        }
    }

    /// Sets the contact email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the country code
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Sets the follower count
    pub fn with_follower_count(mut self, count: u32) -> Self {
        self.follower_count = count;
        self
    }

    /// Sets the avatar image URL
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// Sets the subscription plan name
    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }
}

/// Holds the current session, if any
///
/// The store is handed to the components that need it; it is never
/// reachable through ambient state.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    current: Option<SessionContext>,
}

impl SessionStore {
    /// Creates a store with no active session
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Installs a session context (login)
    ///
    /// Replaces any previous session.
    pub fn login(&mut self, context: SessionContext) {
        self.current = Some(context);
    }

    /// Clears the session (logout)
    ///
    /// Returns true if a session was active.
    pub fn logout(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// The active session, if any
    pub fn current(&self) -> Option<&SessionContext> {
        self.current.as_ref()
    }

    /// Returns true if a session is active
    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }
}

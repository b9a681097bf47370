//! # Session State Machine
//!
//! The pure transition rules behind the session manager, plus the navigation
//! signals it hands back to the UI.
//!
//! ## States and Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                    SessionRestored                                      │
//! │        ┌─────────────────────────────────────────┐                     │
//! │        │                                         ▼                     │
//! │  ┌─────┴───────────┐  LoginStarted   ┌──────────────────┐             │
//! │  │ Unauthenticated │────────────────►│  Authenticating  │             │
//! │  └─────────────────┘◄────────────────└────────┬─────────┘             │
//! │     ▲          ▲        LoginFailed           │ LoginSucceeded         │
//! │     │          │                              ▼                        │
//! │     │          │  LoggedOut           ┌──────────────────┐             │
//! │     │          └──────────────────────│  Authenticated   │◄──┐         │
//! │     │                                 └────────┬─────────┘   │         │
//! │     │ RefreshFailed          TokenRejected     │             │         │
//! │     │                                          ▼             │         │
//! │     │                                 ┌──────────────────┐   │         │
//! │     └─────────────────────────────────│    Refreshing    │───┘         │
//! │                                       └──────────────────┘             │
//! │                                          RefreshSucceeded              │
//! │                                                                         │
//! │  LoggedOut is accepted from every state and always ends Unauthenticated │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::Language;

// =============================================================================
// States and Events
// =============================================================================

/// Where the session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    #[default]
    Unauthenticated,
    /// Credentials are in flight to `/auth/login`.
    Authenticating,
    Authenticated,
    /// A 401 was received and the refresh token is being exchanged.
    Refreshing,
}

impl AuthState {
    /// Whether a user and access token are present in this state.
    pub fn has_session(&self) -> bool {
        matches!(self, AuthState::Authenticated | AuthState::Refreshing)
    }

    /// Applies an event, returning the next state.
    ///
    /// ```rust
    /// use medora_core::{AuthEvent, AuthState};
    ///
    /// let state = AuthState::Unauthenticated
    ///     .apply(AuthEvent::LoginStarted)
    ///     .and_then(|s| s.apply(AuthEvent::LoginSucceeded))
    ///     .unwrap();
    /// assert_eq!(state, AuthState::Authenticated);
    ///
    /// assert!(AuthState::Unauthenticated.apply(AuthEvent::TokenRejected).is_err());
    /// ```
    pub fn apply(self, event: AuthEvent) -> CoreResult<AuthState> {
        use AuthEvent::*;
        use AuthState::*;

        let next = match (self, event) {
            (_, LoggedOut) => Unauthenticated,
            (Unauthenticated, LoginStarted) => Authenticating,
            (Unauthenticated, SessionRestored) => Authenticated,
            (Authenticating, LoginSucceeded) => Authenticated,
            (Authenticating, LoginFailed) => Unauthenticated,
            (Authenticated, TokenRejected) => Refreshing,
            (Refreshing, RefreshSucceeded) => Authenticated,
            (Refreshing, RefreshFailed) => Unauthenticated,
            (from, event) => return Err(CoreError::InvalidTransition { from, event }),
        };
        Ok(next)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
            AuthState::Authenticating => write!(f, "authenticating"),
            AuthState::Authenticated => write!(f, "authenticated"),
            AuthState::Refreshing => write!(f, "refreshing"),
        }
    }
}

/// Something that happened to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEvent {
    LoginStarted,
    LoginSucceeded,
    LoginFailed,
    /// Persisted credentials were found at startup.
    SessionRestored,
    /// A request came back 401 and a refresh will be attempted.
    TokenRejected,
    RefreshSucceeded,
    RefreshFailed,
    LoggedOut,
}

// =============================================================================
// Navigation
// =============================================================================

/// Screen the UI should navigate to after a session operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Route {
    /// Landing screen after login.
    Pharmacy { lang: Language },
    /// Shown after logout.
    Login { lang: Language },
}

impl Route {
    /// Path of the screen, e.g. `/ar/pharmacy`.
    pub fn path(&self) -> String {
        match self {
            Route::Pharmacy { lang } => format!("/{}/pharmacy", lang.code()),
            Route::Login { lang } => format!("/{}/login", lang.code()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

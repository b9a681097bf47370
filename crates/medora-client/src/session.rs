//! # Session Manager
//!
//! Owns the signed-in session and every HTTP request made on its behalf.
//!
//! ## Request Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Request Pipeline                                │
//! │                                                                         │
//! │  PortalApi ──► send(ApiRequest)                                        │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │         attach "Authorization: Bearer T1"                               │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │              ┌─────────┐  2xx / 4xx / 5xx (not 401)                     │
//! │              │ execute │───────────────────────────────► caller         │
//! │              └────┬────┘                                                │
//! │                   │ 401, refresh token present                          │
//! │                   ▼                                                     │
//! │    ┌─────────────────────────────┐                                      │
//! │    │ refresh lock (single-flight)│  T1 no longer current?               │
//! │    │                             │──────────────► retry with current    │
//! │    │ POST /auth/refresh          │                                      │
//! │    └──────┬───────────────┬──────┘                                      │
//! │           │ {token: T2}   │ failure                                     │
//! │           ▼               ▼                                             │
//! │   persist T2,        sign out locally,                                  │
//! │   retry ONCE         return the original 401                            │
//! │   with T2                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! The session lives in a `std::sync::RwLock` that is only held for short
//! synchronous sections (including the session-store write) and never
//! across an `.await`. Refresh attempts are serialised by a separate
//! `tokio::sync::Mutex`.

use medora_core::validation::{validate_login, validate_profile, validate_registration};
use medora_core::{
    AuthEvent, AuthState, Language, Preferences, ProfileUpdate, Registration, Route, UserProfile,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::PortalConfig;
use crate::error::{ClientError, ClientResult, ErrorBody, LOGIN_FALLBACK, SIGNUP_FALLBACK};
use crate::request::{ApiRequest, Envelope};
use crate::storage::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore};

// =============================================================================
// Public Types
// =============================================================================

/// What the UI observes through [`SessionManager::subscribe`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub state: AuthState,
    pub user: Option<UserProfile>,
    /// Theme and language to apply. `None` while signed out.
    pub preferences: Option<Preferences>,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub user: UserProfile,
    /// Where to navigate next (`/{lang}/pharmacy`).
    pub landing: Route,
    /// Toast text when the server reported a previous login.
    pub welcome: Option<String>,
}

// =============================================================================
// Internal State
// =============================================================================

/// User and tokens. Present together or not at all.
#[derive(Debug, Clone)]
struct Session {
    user: UserProfile,
    access_token: String,
    refresh_token: Option<String>,
}

impl Session {
    fn to_persisted(&self) -> PersistedSession {
        PersistedSession {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            user: self.user.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: AuthState,
    session: Option<Session>,
}

impl Inner {
    fn snapshot(&self) -> SessionSnapshot {
        let user = self.session.as_ref().map(|s| s.user.clone());
        SessionSnapshot {
            state: self.state,
            preferences: user.as_ref().map(UserProfile::preferences),
            user,
        }
    }
}

/// What a state change does to the persisted session.
enum StoreSync {
    Keep,
    Save,
    Clear,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    remember_me: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload {
    token: String,
    user: UserProfile,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshPayload {
    token: String,
}

// =============================================================================
// Session Manager
// =============================================================================

/// The single owner of the session. Share it as `Arc<SessionManager>`.
pub struct SessionManager {
    http: reqwest::Client,
    base_url: Url,
    default_language: Language,
    store: Box<dyn SessionStore>,
    inner: RwLock<Inner>,
    refresh_lock: Mutex<()>,
    events: watch::Sender<SessionSnapshot>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("base_url", &self.base_url.as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager that persists through `store`.
    pub fn new(config: &PortalConfig, store: impl SessionStore + 'static) -> ClientResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let (events, _) = watch::channel(SessionSnapshot::default());
        Ok(SessionManager {
            http,
            base_url: config.api_url()?,
            default_language: config.default_language(),
            store: Box::new(store),
            inner: RwLock::new(Inner::default()),
            refresh_lock: Mutex::new(()),
            events,
        })
    }

    /// Creates a manager persisting to `session.json` in the configured data
    /// directory, or in memory when no directory can be determined.
    pub fn from_config(config: &PortalConfig) -> ClientResult<Self> {
        match config.session_file() {
            Some(path) => {
                debug!(path = %path.display(), "Using file session store");
                Self::new(config, FileSessionStore::new(path))
            }
            None => {
                warn!("No data directory available, session will not survive restarts");
                Self::new(config, MemorySessionStore::new())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn state(&self) -> AuthState {
        self.read().state
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.read().session.as_ref().map(|s| s.user.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().session.as_ref().map(|s| s.access_token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().state.has_session()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read().snapshot()
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.events.subscribe()
    }

    /// Language for screens shown without a user.
    pub fn language(&self) -> Language {
        self.read()
            .session
            .as_ref()
            .and_then(|s| s.user.lang)
            .unwrap_or(self.default_language)
    }

    // -------------------------------------------------------------------------
    // Session Lifecycle
    // -------------------------------------------------------------------------

    /// Signs in with email and password.
    ///
    /// The refresh token is kept only when `remember_me` is set; otherwise
    /// any stale one is dropped.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> ClientResult<LoginOutcome> {
        validate_login(email, password)?;
        self.commit(AuthEvent::LoginStarted, |_| StoreSync::Keep)?;

        let payload = match self.request_login(email, password, remember_me).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Login failed");
                if let Err(state_err) = self.commit(AuthEvent::LoginFailed, |_| StoreSync::Keep) {
                    debug!(error = %state_err, "Login failure raced with another session change");
                }
                return Err(e);
            }
        };

        let user = payload.user;
        let session = Session {
            user: user.clone(),
            access_token: payload.token,
            refresh_token: payload.refresh_token.filter(|_| remember_me),
        };
        let keeps_refresh = session.refresh_token.is_some();

        self.commit(AuthEvent::LoginSucceeded, move |slot| {
            *slot = Some(session);
            StoreSync::Save
        })?;

        info!(remember_me, keeps_refresh, "Signed in");
        Ok(LoginOutcome {
            landing: Route::Pharmacy {
                lang: user.lang.unwrap_or_default(),
            },
            welcome: user.welcome_message(),
            user,
        })
    }

    async fn request_login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> ClientResult<LoginPayload> {
        let request = ApiRequest::post("auth/login").json(&LoginRequest {
            email,
            password,
            remember_me,
        })?;

        let (status, body) = self.round_trip(&request, None).await.map_err(|e| {
            debug!(error = %e, "Login request did not reach the server");
            ClientError::Network {
                message: LOGIN_FALLBACK.to_string(),
            }
        })?;

        if !status.is_success() {
            return Err(ClientError::Authentication {
                message: ErrorBody::parse(&body)
                    .top_message()
                    .unwrap_or(LOGIN_FALLBACK)
                    .to_string(),
            });
        }

        Envelope::<LoginPayload>::unwrap_data(&body).map_err(|e| {
            debug!(error = %e, "Unexpected login response");
            ClientError::Authentication {
                message: LOGIN_FALLBACK.to_string(),
            }
        })
    }

    /// Registers a new account. Never signs in.
    pub async fn signup(&self, registration: &Registration) -> ClientResult<()> {
        validate_registration(registration)?;

        let request = ApiRequest::post("auth/register").json(registration)?;
        let (status, body) = self.round_trip(&request, None).await.map_err(|e| {
            warn!(error = %e, "Signup request did not reach the server");
            ClientError::Network {
                message: SIGNUP_FALLBACK.to_string(),
            }
        })?;

        if !status.is_success() {
            let message = ErrorBody::parse(&body)
                .message()
                .unwrap_or(SIGNUP_FALLBACK)
                .to_string();
            warn!(status = status.as_u16(), "Signup rejected");
            return Err(ClientError::Registration { message });
        }

        info!("Account registered");
        Ok(())
    }

    /// Signs out.
    ///
    /// Tells the server first (best effort, failures are only logged), then
    /// clears the session no matter what. Returns the login screen route.
    pub async fn logout(&self) -> Route {
        let lang = self.language();

        if let Some(token) = self.access_token() {
            let request = ApiRequest::post("auth/logout");
            if let Err(e) = self.execute(&request, Some(&token)).await {
                warn!(error = %e, "Server-side logout failed, clearing local session anyway");
            }
        }

        self.sign_out_locally(AuthEvent::LoggedOut);
        info!("Signed out");
        Route::Login { lang }
    }

    /// Reinstates a persisted session without touching the network.
    ///
    /// Returns the restored user, or `None` when nothing usable was stored.
    pub fn restore_session(&self) -> ClientResult<Option<UserProfile>> {
        let persisted = match self.store.load() {
            Ok(Some(persisted)) if !persisted.access_token.is_empty() => persisted,
            Ok(_) => {
                debug!("No persisted session");
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable persisted session");
                return Ok(None);
            }
        };

        let user = persisted.user.clone();
        let session = Session {
            user: persisted.user,
            access_token: persisted.access_token,
            refresh_token: persisted.refresh_token,
        };
        self.commit(AuthEvent::SessionRestored, move |slot| {
            *slot = Some(session);
            StoreSync::Keep
        })?;

        info!("Session restored");
        Ok(Some(user))
    }

    /// Saves name and phone, then updates the session's user.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<UserProfile> {
        validate_profile(update, None)?;
        if !self.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }

        self.send(&ApiRequest::put("users/profile").json(update)?).await?;

        let mut inner = self.write();
        let session = inner.session.as_mut().ok_or_else(|| {
            ClientError::InvalidState("session ended while the profile was being saved".into())
        })?;
        session.user.name = update.name.clone();
        session.user.phone = update.phone.clone();
        let user = session.user.clone();
        let persisted = session.to_persisted();

        if let Err(e) = self.store.save(&persisted) {
            warn!(error = %e, "Failed to persist updated profile");
        }
        self.events.send_replace(inner.snapshot());

        info!("Profile updated");
        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Request Pipeline
    // -------------------------------------------------------------------------

    /// Sends a request with the bearer token, refreshing and retrying once on
    /// a 401. Returns the raw success body.
    pub async fn send(&self, request: &ApiRequest) -> ClientResult<String> {
        let token = self.access_token();
        let err = match self.execute(request, token.as_deref()).await {
            Err(err) if err.is_unauthorized() => err,
            other => return other,
        };

        let Some(rejected) = token else {
            return Err(err);
        };

        match self.refresh_single_flight(&rejected).await {
            Ok(Some(fresh)) => {
                debug!(path = %request.path, "Retrying with refreshed token");
                self.execute(request, Some(&fresh)).await
            }
            Ok(None) => Err(err),
            Err(refresh_err) => {
                warn!(error = %refresh_err, "Token refresh failed, session ended");
                Err(err)
            }
        }
    }

    /// Like [`send`](Self::send) but decodes the `data` envelope.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> ClientResult<T> {
        let body = self.send(request).await?;
        Envelope::unwrap_data(&body)
    }

    /// Exchanges the refresh token, at most once per rejected token.
    ///
    /// - `Ok(Some(token))`: retry with `token`
    /// - `Ok(None)`: no refresh possible, surface the original error
    /// - `Err(_)`: exchange failed, the session has been cleared
    ///
    /// A failed exchange signs out locally only. Unlike [`logout`](Self::logout)
    /// it sends no `POST /auth/logout`, since the server has already rejected
    /// the bearer that request would carry.
    async fn refresh_single_flight(&self, rejected: &str) -> ClientResult<Option<String>> {
        let _guard = self.refresh_lock.lock().await;

        let (current, refresh_token) = {
            let inner = self.read();
            match inner.session.as_ref() {
                Some(s) => (s.access_token.clone(), s.refresh_token.clone()),
                None => {
                    debug!("Session ended before refresh");
                    return Ok(None);
                }
            }
        };

        if current != rejected {
            debug!("Token already refreshed by a concurrent request");
            return Ok(Some(current));
        }

        let Some(refresh_token) = refresh_token else {
            debug!("No refresh token, not refreshing");
            return Ok(None);
        };

        self.commit(AuthEvent::TokenRejected, |_| StoreSync::Keep)?;

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(token) => {
                let installed = token.clone();
                self.commit(AuthEvent::RefreshSucceeded, move |slot| match slot {
                    Some(session) => {
                        session.access_token = installed;
                        StoreSync::Save
                    }
                    None => StoreSync::Keep,
                })?;
                info!("Access token refreshed");
                Ok(Some(token))
            }
            Err(e) => {
                self.sign_out_locally(AuthEvent::RefreshFailed);
                Err(e)
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> ClientResult<String> {
        let request = ApiRequest::post("auth/refresh").json(&RefreshRequest { refresh_token })?;

        let (status, body) = self
            .round_trip(&request, None)
            .await
            .map_err(|e| ClientError::TokenRefresh {
                message: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(ClientError::TokenRefresh {
                message: ErrorBody::parse(&body)
                    .message()
                    .map(String::from)
                    .unwrap_or_else(|| format!("server answered {}", status.as_u16())),
            });
        }

        Envelope::<RefreshPayload>::unwrap_data(&body)
            .map(|payload| payload.token)
            .map_err(|e| ClientError::TokenRefresh {
                message: e.to_string(),
            })
    }

    /// One attempt, success bodies only.
    async fn execute(&self, request: &ApiRequest, bearer: Option<&str>) -> ClientResult<String> {
        let (status, body) = self.round_trip(request, bearer).await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::from_response(status, &body))
        }
    }

    /// One attempt, any status. Errors only when no response arrived.
    async fn round_trip(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> ClientResult<(StatusCode, String)> {
        let url = self.base_url.join(&request.path)?;
        let request_id = Uuid::new_v4();
        debug!(
            %request_id,
            method = %request.method,
            path = %request.path,
            authorized = bearer.is_some(),
            "Dispatching request"
        );

        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await.map_err(|e| ClientError::Network {
            message: e.to_string(),
        })?;

        debug!(%request_id, status = status.as_u16(), "Response received");
        Ok((status, body))
    }

    // -------------------------------------------------------------------------
    // State Helpers
    // -------------------------------------------------------------------------

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `event`, lets `update` edit the session, mirrors the result to
    /// the store and publishes a snapshot. All under one write lock.
    fn commit<F>(&self, event: AuthEvent, update: F) -> ClientResult<AuthState>
    where
        F: FnOnce(&mut Option<Session>) -> StoreSync,
    {
        let mut inner = self.write();
        let from = inner.state;
        let next = from.apply(event)?;

        let sync = update(&mut inner.session);
        inner.state = next;

        let stored = match (sync, inner.session.as_ref()) {
            (StoreSync::Save, Some(session)) => self.store.save(&session.to_persisted()),
            (StoreSync::Save, None) | (StoreSync::Clear, _) => self.store.clear(),
            (StoreSync::Keep, _) => Ok(()),
        };
        if let Err(e) = stored {
            warn!(error = %e, "Failed to sync persisted session");
        }

        self.events.send_replace(inner.snapshot());
        debug!(%from, to = %next, ?event, "Session state changed");
        Ok(next)
    }

    /// Drops the session from memory and storage.
    fn sign_out_locally(&self, event: AuthEvent) {
        let cleared = self.commit(event, |slot| {
            *slot = None;
            StoreSync::Clear
        });

        if let Err(e) = cleared {
            // Only RefreshFailed can be rejected here, after a concurrent logout.
            debug!(error = %e, "Session already cleared");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

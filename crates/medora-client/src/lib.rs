//! # medora-client: Session Manager and REST Client for the Medora Portal
//!
//! Everything in the portal that touches the network, the disk or the
//! environment.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                   SessionManager (one per app)                   │  │
//! │  │                                                                  │  │
//! │  │  login / signup / logout / restore_session / update_profile     │  │
//! │  │  send(): bearer header, 401 → single-flight refresh → retry     │  │
//! │  │  subscribe(): watch channel of SessionSnapshot                   │  │
//! │  └───────┬──────────────────────┬───────────────────────┬───────────┘  │
//! │          │                      │                       │              │
//! │          ▼                      ▼                       ▼              │
//! │  ┌────────────────┐  ┌────────────────────┐  ┌──────────────────────┐  │
//! │  │   PortalApi    │  │   SessionStore     │  │    PortalConfig      │  │
//! │  │                │  │                    │  │                      │  │
//! │  │ pharmacies     │  │ session.json 0600  │  │ defaults → TOML →    │  │
//! │  │ products       │  │ or in-memory       │  │ MEDORA_* env vars    │  │
//! │  │ invoices       │  │                    │  │                      │  │
//! │  └────────────────┘  └────────────────────┘  └──────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use medora_client::{PortalApi, PortalConfig, SessionManager};
//!
//! # async fn run() -> medora_client::ClientResult<()> {
//! medora_client::logging::init_tracing();
//!
//! let config = PortalConfig::load_or_default(None);
//! let session = Arc::new(SessionManager::from_config(&config)?);
//!
//! if session.restore_session()?.is_none() {
//!     let outcome = session.login("sara@example.com", "secret1", true).await?;
//!     println!("navigate to {}", outcome.landing.path());
//! }
//!
//! let api = PortalApi::new(session.clone());
//! let pharmacies = api.available_pharmacies().await?;
//! println!("{} pharmacies", pharmacies.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//! - [`session`] - `SessionManager` and the request pipeline
//! - [`api`] - Typed endpoint wrappers
//! - [`storage`] - Session persistence
//! - [`request`] - Replayable request descriptions
//! - [`config`] - Configuration loading
//! - [`error`] - Client error types
//! - [`logging`] - Tracing setup

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod request;
pub mod session;
pub mod storage;

pub use api::{Category, PortalApi, ProductQuery};
pub use config::PortalConfig;
pub use error::{ClientError, ClientResult};
pub use request::{ApiRequest, Envelope};
pub use session::{LoginOutcome, SessionManager, SessionSnapshot};
pub use storage::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore};

//! Shared fixtures for the HTTP pipeline tests.

#![allow(dead_code)]

use std::sync::Arc;

use medora_client::{MemorySessionStore, PersistedSession, PortalConfig, SessionManager};
use serde_json::{json, Value};
use wiremock::{MockServer, ResponseTemplate};

/// Config pointing at the mock server's `/api` prefix.
pub fn config_for(server: &MockServer) -> PortalConfig {
    let mut config = PortalConfig::default();
    config.api.base_url = format!("{}/api", server.uri());
    config
}

pub fn user_json() -> Value {
    json!({
        "name": "Sara",
        "email": "sara@example.com",
        "phone": "0501234567",
        "theme": "dark",
        "lang": "ar",
        "lastLogin": "2024-03-05T14:30:00Z"
    })
}

pub fn login_response(token: &str, refresh_token: Option<&str>) -> ResponseTemplate {
    let mut data = json!({ "token": token, "user": user_json() });
    if let Some(refresh) = refresh_token {
        data["refreshToken"] = json!(refresh);
    }
    ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
}

pub fn data(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": value }))
}

pub fn error(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "message": message }))
}

pub fn persisted(access: &str, refresh: Option<&str>) -> PersistedSession {
    PersistedSession {
        access_token: access.to_string(),
        refresh_token: refresh.map(String::from),
        user: serde_json::from_value(user_json()).unwrap(),
    }
}

/// A manager already signed in with `access`/`refresh`, plus a handle on its
/// store.
pub fn signed_in(
    server: &MockServer,
    access: &str,
    refresh: Option<&str>,
) -> (Arc<SessionManager>, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::with_session(persisted(access, refresh)));
    let manager = SessionManager::new(&config_for(server), store.clone()).unwrap();
    manager.restore_session().unwrap();
    (Arc::new(manager), store)
}

pub fn signed_out(server: &MockServer) -> (Arc<SessionManager>, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    let manager = SessionManager::new(&config_for(server), store.clone()).unwrap();
    (Arc::new(manager), store)
}

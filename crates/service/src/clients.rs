// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client registration and heartbeat bookkeeping.
//!
//! A side-channel to the translation surface: clients register after
//! connecting, heartbeat periodically, and are dropped once idle or
//! expired. Nothing in the translation path depends on it.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How long a registration stays valid.
const REGISTRATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Heartbeat cadence advertised to clients.
const HEARTBEAT_INTERVAL_SECS: u32 = 30;

/// A registered client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: String,
    pub client_name: String,
    pub client_version: String,
    pub namespace: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub registered_at: SystemTime,
    pub last_heartbeat: SystemTime,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub client_id: String,
    pub heartbeat_interval_secs: u32,
    pub expires_at_ms: u64,
}

/// Result of a heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HeartbeatOutcome {
    Acknowledged,
    /// Registration missing, mismatched or expired; client must re-register.
    ReRegister { reason: String },
}

/// Tracks registered clients and their heartbeats.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, ClientInfo>>,
    counter: RwLock<u64>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        client_name: &str,
        client_version: &str,
        namespace: &str,
        metadata: HashMap<String, String>,
    ) -> Registration {
        let now = SystemTime::now();
        let client_id = {
            let mut counter = self.counter.write();
            *counter += 1;
            format!("iskoces-client-{}-{}", epoch_secs(now), counter)
        };

        let client = ClientInfo {
            client_id: client_id.clone(),
            client_name: client_name.to_string(),
            client_version: client_version.to_string(),
            namespace: namespace.to_string(),
            metadata,
            registered_at: now,
            last_heartbeat: now,
        };
        self.clients.write().insert(client_id.clone(), client);

        info!(client_id = %client_id, client_name, "client registered");

        Registration {
            client_id,
            heartbeat_interval_secs: HEARTBEAT_INTERVAL_SECS,
            expires_at_ms: epoch_ms(now + REGISTRATION_TTL),
        }
    }

    pub fn heartbeat(&self, client_id: &str, client_name: &str) -> HeartbeatOutcome {
        let mut clients = self.clients.write();

        let Some(client) = clients.get_mut(client_id) else {
            warn!(client_id, client_name, "heartbeat from unknown client");
            return HeartbeatOutcome::ReRegister {
                reason: "client not registered or expired".to_string(),
            };
        };

        if client.client_name != client_name {
            warn!(
                expected = %client.client_name,
                got = client_name,
                "heartbeat client name mismatch"
            );
            return HeartbeatOutcome::ReRegister {
                reason: "client name mismatch".to_string(),
            };
        }

        client.last_heartbeat = SystemTime::now();

        let expired = client
            .registered_at
            .elapsed()
            .map(|age| age > REGISTRATION_TTL)
            .unwrap_or(false);
        if expired {
            warn!(client_id, client_name, "client registration expired");
            clients.remove(client_id);
            return HeartbeatOutcome::ReRegister {
                reason: "registration expired".to_string(),
            };
        }

        HeartbeatOutcome::Acknowledged
    }

    /// Drop clients whose last heartbeat is older than `max_idle`.
    pub fn cleanup_expired(&self, max_idle: Duration) -> usize {
        let now = SystemTime::now();
        let mut clients = self.clients.write();
        let before = clients.len();
        clients.retain(|_, client| {
            now.duration_since(client.last_heartbeat)
                .map(|idle| idle <= max_idle)
                .unwrap_or(true)
        });
        let removed = before - clients.len();
        if removed > 0 {
            info!(removed, remaining = clients.len(), "cleaned up expired clients");
        }
        removed
    }

    pub fn clients(&self) -> Vec<ClientInfo> {
        self.clients.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

fn epoch_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn epoch_ms(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "clients_tests.rs"]
mod tests;

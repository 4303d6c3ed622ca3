// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn register_assigns_unique_ids() {
    let registry = ClientRegistry::new();

    let a = registry.register("nanabush", "1.0", "default", HashMap::new());
    let b = registry.register("nanabush", "1.0", "default", HashMap::new());

    assert_ne!(a.client_id, b.client_id);
    assert!(a.client_id.starts_with("iskoces-client-"));
    assert_eq!(a.heartbeat_interval_secs, 30);
    assert!(a.expires_at_ms > 0);
    assert_eq!(registry.len(), 2);
}

#[test]
fn heartbeat_acknowledges_known_client() {
    let registry = ClientRegistry::new();
    let reg = registry.register("nanabush", "1.0", "default", HashMap::new());

    assert_eq!(
        registry.heartbeat(&reg.client_id, "nanabush"),
        HeartbeatOutcome::Acknowledged
    );
}

#[test]
fn heartbeat_from_unknown_client_requires_reregister() {
    let registry = ClientRegistry::new();

    match registry.heartbeat("iskoces-client-0-0", "nanabush") {
        HeartbeatOutcome::ReRegister { reason } => {
            assert!(reason.contains("not registered"));
        }
        other => panic!("expected re-register, got {:?}", other),
    }
}

#[test]
fn heartbeat_name_mismatch_requires_reregister() {
    let registry = ClientRegistry::new();
    let reg = registry.register("nanabush", "1.0", "default", HashMap::new());

    match registry.heartbeat(&reg.client_id, "impostor") {
        HeartbeatOutcome::ReRegister { reason } => {
            assert!(reason.contains("mismatch"));
        }
        other => panic!("expected re-register, got {:?}", other),
    }
    // The original registration is untouched.
    assert_eq!(registry.len(), 1);
}

#[test]
fn cleanup_drops_idle_clients() {
    let registry = ClientRegistry::new();
    registry.register("one", "1.0", "", HashMap::new());
    registry.register("two", "1.0", "", HashMap::new());

    // Generous idle window keeps everyone.
    assert_eq!(registry.cleanup_expired(Duration::from_secs(60)), 0);
    assert_eq!(registry.len(), 2);

    // Zero idle window drops everyone.
    std::thread::sleep(Duration::from_millis(5));
    assert_eq!(registry.cleanup_expired(Duration::ZERO), 2);
    assert!(registry.is_empty());
}

#[test]
fn metadata_is_preserved() {
    let registry = ClientRegistry::new();
    let mut metadata = HashMap::new();
    metadata.insert("pod".to_string(), "nanabush-7f".to_string());

    let reg = registry.register("nanabush", "2.1", "prod", metadata);
    let clients = registry.clients();
    let client = clients
        .iter()
        .find(|c| c.client_id == reg.client_id)
        .unwrap();

    assert_eq!(client.client_version, "2.1");
    assert_eq!(client.namespace, "prod");
    assert_eq!(client.metadata.get("pod").unwrap(), "nanabush-7f");
}

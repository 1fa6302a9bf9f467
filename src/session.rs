use crate::error::{NodeError, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

/// A component's registration in the cluster metadata store
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub session_id: Uuid,
    pub role: String,
    pub server_id: i64,
    pub address: String,
    pub registered_at: DateTime<Utc>,
}

/// In-process cluster metadata store used by standalone deployments
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<(String, i64), Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new session. A role may hold one session per server id.
    pub fn register(&self, role: &str, server_id: i64, address: &str) -> Result<Session> {
        let mut sessions = self.sessions.write();
        let key = (role.to_string(), server_id);

        if let Some(existing) = sessions.get(&key) {
            return Err(NodeError::session(format!(
                "{} (server id {}) is already registered as session {}",
                role, server_id, existing.session_id
            )));
        }

        let session = Session {
            session_id: Uuid::new_v4(),
            role: role.to_string(),
            server_id,
            address: address.to_string(),
            registered_at: Utc::now(),
        };
        sessions.insert(key, session.clone());

        info!(
            "Registered session {} for {} (server id {}) at {}",
            session.session_id, role, server_id, address
        );
        Ok(session)
    }

    pub fn deregister(&self, role: &str, server_id: i64) -> Option<Session> {
        let removed = self
            .sessions
            .write()
            .remove(&(role.to_string(), server_id));
        if let Some(session) = &removed {
            debug!("Deregistered session {} for {}", session.session_id, role);
        }
        removed
    }

    /// All sessions held by `role`, ordered by server id
    pub fn get(&self, role: &str) -> Vec<Session> {
        let mut found: Vec<Session> = self
            .sessions
            .read()
            .values()
            .filter(|session| session.role == role)
            .cloned()
            .collect();
        found.sort_by_key(|session| session.server_id);
        found
    }

    pub fn sessions(&self) -> Vec<Session> {
        let mut all: Vec<Session> = self.sessions.read().values().cloned().collect();
        all.sort_by(|a, b| (&a.role, a.server_id).cmp(&(&b.role, b.server_id)));
        all
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty());

        let session = registry.register("querynode", 7, "127.0.0.1:21123").unwrap();
        assert_eq!(session.role, "querynode");
        assert_eq!(session.server_id, 7);

        let found = registry.get("querynode");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].session_id, session.session_id);
        assert!(registry.get("rootcoord").is_empty());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let registry = SessionRegistry::new();
        registry.register("rootcoord", 1, "127.0.0.1:53100").unwrap();

        let err = registry
            .register("rootcoord", 1, "127.0.0.1:53100")
            .unwrap_err();
        assert!(matches!(err, NodeError::Session { .. }));

        // Same role, different server id is fine
        registry.register("rootcoord", 2, "127.0.0.1:53101").unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_deregister() {
        let registry = SessionRegistry::new();
        registry.register("indexcoord", 1, "127.0.0.1:31000").unwrap();

        assert!(registry.deregister("indexcoord", 1).is_some());
        assert!(registry.deregister("indexcoord", 1).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sessions_are_sorted() {
        let registry = SessionRegistry::new();
        registry.register("querynode", 2, "a").unwrap();
        registry.register("indexcoord", 1, "b").unwrap();
        registry.register("querynode", 1, "c").unwrap();

        let roles: Vec<(String, i64)> = registry
            .sessions()
            .into_iter()
            .map(|s| (s.role, s.server_id))
            .collect();
        assert_eq!(
            roles,
            vec![
                ("indexcoord".to_string(), 1),
                ("querynode".to_string(), 1),
                ("querynode".to_string(), 2),
            ]
        );
    }
}

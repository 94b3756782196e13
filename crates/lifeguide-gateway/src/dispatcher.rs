use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::RwLock;

const CLIENT_ID_LEN: usize = 7;
const CLIENT_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A live WebSocket client.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub client_id: String,
    pub user_id: String,
    pub connected_at: DateTime<Utc>,
}

/// Registry of connected clients.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    /// client_id -> client
    clients: RwLock<HashMap<String, ClientInfo>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client under a fresh id. Until it authenticates the
    /// client acts as `demo-user-<clientId>`.
    pub async fn register(&self) -> ClientInfo {
        let mut clients = self.inner.clients.write().await;

        let client_id = loop {
            let candidate = generate_client_id(&mut rand::rng());
            if !clients.contains_key(&candidate) {
                break candidate;
            }
        };

        let client = ClientInfo {
            user_id: format!("demo-user-{}", client_id),
            client_id: client_id.clone(),
            connected_at: Utc::now(),
        };
        clients.insert(client_id, client.clone());
        client
    }

    /// Rebind a client to another user id.
    pub async fn set_user(&self, client_id: &str, user_id: String) {
        if let Some(client) = self.inner.clients.write().await.get_mut(client_id) {
            client.user_id = user_id;
        }
    }

    /// Remove a client, returning its record if it was registered.
    pub async fn unregister(&self, client_id: &str) -> Option<ClientInfo> {
        self.inner.clients.write().await.remove(client_id)
    }

    pub async fn client_count(&self) -> usize {
        self.inner.clients.read().await.len()
    }

    pub async fn client(&self, client_id: &str) -> Option<ClientInfo> {
        self.inner.clients.read().await.get(client_id).cloned()
    }
}

/// Random lowercase base36 id.
pub fn generate_client_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CLIENT_ID_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CLIENT_ID_ALPHABET.len());
            CLIENT_ID_ALPHABET[idx] as char
        })
        .collect()
}

//! # Cart Storage Adapters
//!
//! Two [`CartStorage`] implementations: an in-memory slot for tests and
//! fresh sessions, and a JSON file for carts that must survive a client
//! restart.
//!
//! Both honor the port contract: a missing or malformed payload loads as
//! "no cart" (warn log, never an error), and writes are best-effort.

use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::{debug, warn};

use checkout_core::Cart;

use crate::ports::CartStorage;

// =============================================================================
// In-Memory Storage
// =============================================================================

/// Keeps the serialized cart in a process-local slot.
///
/// Stores the JSON payload rather than the `Cart` value so tests exercise
/// the same serialization path as the file adapter (and can inject corrupt
/// payloads via [`put_raw`]).
///
/// [`put_raw`]: InMemoryCartStorage::put_raw
#[derive(Debug, Default)]
pub struct InMemoryCartStorage {
    slot: RwLock<Option<String>>,
}

impl InMemoryCartStorage {
    /// Creates an empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored payload verbatim (test hook for corruption).
    pub fn put_raw(&self, payload: &str) {
        *self.slot.write().expect("cart storage lock poisoned") = Some(payload.to_string());
    }

    /// Returns the stored payload, if any.
    pub fn raw(&self) -> Option<String> {
        self.slot.read().expect("cart storage lock poisoned").clone()
    }
}

impl CartStorage for InMemoryCartStorage {
    fn load(&self) -> Option<Cart> {
        let slot = self.slot.read().expect("cart storage lock poisoned");
        let payload = slot.as_ref()?;

        match serde_json::from_str(payload) {
            Ok(cart) => Some(cart),
            Err(err) => {
                warn!(%err, "persisted cart is malformed, starting empty");
                None
            }
        }
    }

    fn save(&self, cart: &Cart) {
        match serde_json::to_string(cart) {
            Ok(payload) => {
                *self.slot.write().expect("cart storage lock poisoned") = Some(payload);
            }
            Err(err) => warn!(%err, "failed to serialize cart, not persisted"),
        }
    }

    fn clear(&self) {
        *self.slot.write().expect("cart storage lock poisoned") = None;
    }
}

// =============================================================================
// JSON File Storage
// =============================================================================

/// Persists the cart as a JSON file keyed to the cashier session.
#[derive(Debug, Clone)]
pub struct JsonFileCartStorage {
    path: PathBuf,
}

impl JsonFileCartStorage {
    /// Creates a file-backed storage at `path`. The file is created on the
    /// first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileCartStorage { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl CartStorage for JsonFileCartStorage {
    fn load(&self) -> Option<Cart> {
        let payload = match fs::read_to_string(&self.path) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(path = %self.path.display(), %err, "no persisted cart to restore");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(cart) => Some(cart),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "persisted cart is malformed, starting empty");
                None
            }
        }
    }

    fn save(&self, cart: &Cart) {
        let payload = match serde_json::to_string(cart) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, "failed to serialize cart, not persisted");
                return;
            }
        };

        if let Err(err) = fs::write(&self.path, payload) {
            warn!(path = %self.path.display(), %err, "failed to persist cart");
        }
    }

    fn clear(&self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), %err, "failed to drop persisted cart");
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! Capabilities the host application injects into the session engine.
//!
//! The engine never touches a UI or disk directly: it calls [`Host`] to show
//! notifications and render message slots, and [`ConfigPersistence`] to load
//! and save the configuration blob.

use crate::config::Configuration;
use crate::session::MessageId;
use std::sync::{Arc, Mutex, PoisonError};

/// Notification and render surface provided by the host.
pub trait Host: Send + Sync {
    /// Fire-and-forget user-visible notice (toast, status line, stderr).
    fn notify(&self, message: &str);

    /// Render `markdown` into the surface slot for `slot`, replacing what was there.
    /// Called again for the same slot whenever its message changes.
    fn render(&self, slot: MessageId, markdown: &str);
}

/// Load-on-start / save-on-change storage for [`Configuration`].
pub trait ConfigPersistence: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> anyhow::Result<Option<Configuration>>;
    fn save(&self, config: &Configuration) -> anyhow::Result<()>;
}

/// In-memory persistence for hosts without storage. Clones share the same slot.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    slot: Arc<Mutex<Option<Configuration>>>,
}

impl MemoryPersistence {
    /// Last saved configuration.
    pub fn saved(&self) -> Option<Configuration> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ConfigPersistence for MemoryPersistence {
    fn load(&self) -> anyhow::Result<Option<Configuration>> {
        Ok(self.saved())
    }

    fn save(&self, config: &Configuration) -> anyhow::Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());
        Ok(())
    }
}

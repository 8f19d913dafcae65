//! Render seam: message slot changes become host render calls.
//!
//! Actual markdown rendering belongs to the host; this module only decides
//! what text a slot shows and re-issues it whenever the slot changes.

use crate::host::Host;
use crate::session::{Message, MessageId};
use std::sync::Arc;

pub struct RenderPipeline {
    host: Arc<dyn Host>,
}

impl RenderPipeline {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    /// Re-render exactly one slot. Stateless, so repeated calls for the same
    /// slot and message produce the same output.
    pub fn message_changed(&self, slot: MessageId, message: &Message) {
        self.host.render(slot, &display_markdown(message));
    }

    /// Re-render every slot in order.
    pub fn render_all(&self, messages: &[Message]) {
        for (i, message) in messages.iter().enumerate() {
            self.message_changed(MessageId::new(i), message);
        }
    }
}

/// Sender label followed by the message content.
pub fn display_markdown(message: &Message) -> String {
    format!("{}: {}", message.sender.label(), message.content)
}

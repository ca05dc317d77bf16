//! Untrusted page channel. Anything on the page can post to it, so every
//! envelope must carry our source tag before its payload is even decoded.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::errors::BridgeError;
use crate::messages::{InboundMessage, OutboundMessage};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageEnvelope<T> {
    pub source: String,
    pub payload: T,
}

#[derive(Clone, Debug)]
pub struct PageChannel {
    source_tag: String,
}

impl PageChannel {
    pub fn new(source_tag: impl Into<String>) -> Self {
        Self {
            source_tag: source_tag.into(),
        }
    }

    pub fn source_tag(&self) -> &str {
        &self.source_tag
    }

    /// Decode a raw page message. Foreign or tagless envelopes yield
    /// `Ok(None)`; ours with a bad payload are an error.
    pub fn accept(&self, raw: &str) -> Result<Option<InboundMessage>, BridgeError> {
        let envelope: PageEnvelope<Value> = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(error = %err, "ignoring non-envelope page message");
                return Ok(None);
            }
        };
        if envelope.source != self.source_tag {
            debug!(source = %envelope.source, "dropping page message from foreign source");
            return Ok(None);
        }
        let message: InboundMessage = serde_json::from_value(envelope.payload).map_err(|err| {
            error!(error = %err, "rejected malformed page message");
            BridgeError::from(err)
        })?;
        if !message.allowed_from_page() {
            error!(message = message.name(), "rejected page message for another context");
            return Err(BridgeError::WrongContext(message.name()));
        }
        Ok(Some(message))
    }

    pub fn wrap(&self, message: OutboundMessage) -> PageEnvelope<OutboundMessage> {
        PageEnvelope {
            source: self.source_tag.clone(),
            payload: message,
        }
    }
}

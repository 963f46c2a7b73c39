//! Relay configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Upper bound for the per-connection outbound queue.
pub const MAX_OUTBOUND_BUFFER: usize = 4096;

/// Upper bound for the configurable message length.
pub const MAX_MESSAGE_LEN_LIMIT: usize = 65536;

/// Relay tuning
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Frames buffered per connection before deliveries start failing
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Maximum chat message length, in characters
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

impl RelayConfig {
    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_OUTBOUND_BUFFER).contains(&self.outbound_buffer) {
            return Err(ValidationError::InvalidOutboundBuffer {
                max: MAX_OUTBOUND_BUFFER,
            });
        }
        if !(1..=MAX_MESSAGE_LEN_LIMIT).contains(&self.max_message_len) {
            return Err(ValidationError::InvalidMaxMessageLen {
                max: MAX_MESSAGE_LEN_LIMIT,
            });
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: default_outbound_buffer(),
            max_message_len: default_max_message_len(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    crate::adapters::websocket::DEFAULT_OUTBOUND_BUFFER
}

fn default_max_message_len() -> usize {
    crate::application::DEFAULT_MAX_MESSAGE_LEN
}

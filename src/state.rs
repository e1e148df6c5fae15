use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::services::{IdentityResolver, MessageStore, ParticipantDirectory};
use crate::websocket::RelayRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: RelayRegistry,
    pub identity: Arc<dyn IdentityResolver>,
    pub directory: Arc<dyn ParticipantDirectory>,
    pub messages: Arc<dyn MessageStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds state around a fresh, empty session registry.
    pub fn new(
        config: Arc<Config>,
        identity: Arc<dyn IdentityResolver>,
        directory: Arc<dyn ParticipantDirectory>,
        messages: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            registry: RelayRegistry::new(config.relay.conduit_capacity),
            identity,
            directory,
            messages,
            config,
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.config.relay.idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

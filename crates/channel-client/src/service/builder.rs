use super::core::{Callbacks, ChannelClient};
use crate::codec::Codec;
use crate::config::ClientConfig;
use crate::domain::{MessageHandler, RemoteAddress};
use crate::ports::{Scheduler, Transport};

/// Assembles a [`ChannelClient`] from configuration, an optional codec
/// override and lifecycle callbacks.
pub struct ClientBuilder {
    pub(crate) config: ClientConfig,
    pub(crate) codec: Option<Box<dyn Codec>>,
    pub(crate) callbacks: Callbacks,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            codec: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Target a different broker than the configured one.
    pub fn address(mut self, address: RemoteAddress) -> Self {
        self.config.address = address;
        self
    }

    /// Use `codec` instead of the one named in the configuration.
    pub fn codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codec = Some(Box::new(codec));
        self
    }

    /// Runs after every successful (re)connect, once subscriptions are
    /// replayed.
    pub fn on_connect(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.callbacks.on_connect = Some(Box::new(callback));
        self
    }

    /// Runs after every close, once the reconnect is scheduled.
    pub fn on_close(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.callbacks.on_close = Some(Box::new(callback));
        self
    }

    /// Receives events that have no dedicated handler.
    pub fn on_message(mut self, handler: impl MessageHandler + 'static) -> Self {
        self.callbacks.on_message = Some(Box::new(handler));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build<T: Transport, S: Scheduler>(self, transport: T, scheduler: S) -> ChannelClient<T, S> {
        let codec = self.codec.unwrap_or_else(|| self.config.codec.build());
        ChannelClient::new(self.config, transport, scheduler, codec, self.callbacks)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

//! Timer handling: keepalive pings and delayed reconnects.

use channel_telemetry::KEEPALIVE_PINGS;
use tracing::{debug, trace, warn};

use super::core::ChannelClient;
use crate::ports::{Scheduler, TimerEvent, Transport};

impl<T: Transport, S: Scheduler> ChannelClient<T, S> {
    /// Entry point for every timer fire.
    pub fn on_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Ping => self.ping(),
            TimerEvent::Reconnect => self.reconnect(),
        }
    }

    /// Send one zero-length keepalive payload if a connection exists.
    ///
    /// The keepalive timer is never cancelled by a disconnect; ticks while
    /// disconnected are no-ops.
    pub fn ping(&mut self) {
        let Some(connection) = self.session.connection() else {
            trace!("Keepalive skipped, not connected");
            return;
        };

        let bytes = match self.outbound(Vec::new()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to frame keepalive");
                return;
            }
        };

        match self.transport.send(connection, bytes) {
            Ok(()) => {
                KEEPALIVE_PINGS.inc();
                trace!(connection = %connection, "Keepalive sent");
            }
            Err(e) => warn!(connection = %connection, error = %e, "Keepalive failed"),
        }
    }

    fn reconnect(&mut self) {
        self.clear_reconnect_timer();

        if self.session.connection().is_some() {
            debug!("Reconnect skipped, connection already open");
            return;
        }

        let address = self.session.address().clone();
        debug!(address = %address, "Reconnecting");
        if let Err(e) = self.connect(address) {
            warn!(error = %e, "Reconnect attempt failed");
            let handle = self
                .scheduler
                .once_after(self.config.reconnect_delay, TimerEvent::Reconnect);
            self.session.reconnect_timer = Some(handle);
        }
    }
}

//! Channel multiplexer: shares one physical channel among link sessions

use crate::session::{LinkSession, SessionHandle, SessionRegistry};
use crate::statistics::LinkStatistics;
use dnp3_core::{Dnp3Error, Dnp3Result, LinkFrame, Route};
use dnp3_transport::{Channel, ChannelConnector};
use std::time::Duration;

/// Delay between reconnection attempts when pumping [`IoHandler::run`]
const RECONNECT_DELAY: Duration = Duration::from_millis(500);

/// Transport role of a multiplexer
///
/// The role decides what suspension means: an active (dialing) handler
/// tears its channel down when the last session is disabled, a passive
/// (listening) handler keeps the accepted channel so a re-enable does not
/// force the peer to reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    Active,
    Passive,
}

/// Notification sink for channel lifecycle transitions
///
/// Purely observational; a listener has no control authority over the
/// channel.
pub trait ChannelListener: Send {
    fn on_channel_open(&mut self) {}
    fn on_channel_closed(&mut self) {}
}

/// Manages I/O for a number of link sessions
///
/// Owns the shared channel and the session registry. Guarantees that an
/// inbound frame is delivered to at most one session, that session
/// selection is unambiguous (one enabled session per route), and that at
/// most one transmit is in flight on the channel at a time.
///
/// All operations on one handler are serialized through `&mut self`;
/// distinct handlers (distinct channels) are fully independent.
pub struct IoHandler {
    registry: SessionRegistry,
    role: ChannelRole,
    connector: Box<dyn ChannelConnector>,
    listener: Option<Box<dyn ChannelListener>>,
    channel: Option<Box<dyn Channel>>,
    suspended: bool,
    transmit_pending: bool,
    statistics: LinkStatistics,
}

impl IoHandler {
    /// Create a new multiplexer
    ///
    /// The handler starts suspended with no channel; enabling the first
    /// session starts channel activity.
    pub fn new(role: ChannelRole, connector: Box<dyn ChannelConnector>) -> Self {
        Self {
            registry: SessionRegistry::new(),
            role,
            connector,
            listener: None,
            channel: None,
            suspended: true,
            transmit_pending: false,
            statistics: LinkStatistics::new(),
        }
    }

    /// Attach a channel lifecycle listener
    pub fn with_listener(mut self, listener: Box<dyn ChannelListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Bind a link session to the handler
    ///
    /// Fails without state change if the route is already bound to another
    /// session. The session starts disabled.
    pub fn add_context(
        &mut self,
        session: Box<dyn LinkSession>,
        route: Route,
    ) -> Dnp3Result<SessionHandle> {
        match self.registry.add(session, route) {
            Some(handle) => {
                log::debug!("Registered {} on route {}", handle, route);
                Ok(handle)
            }
            None => {
                log::warn!("Rejected registration: route {} already in use", route);
                Err(Dnp3Error::Link(format!("route {} already in use", route)))
            }
        }
    }

    /// Begin routing frames to and from the session
    ///
    /// Fails if the handle is stale or the session is already enabled.
    /// Enabling the first session resumes channel activity, establishing a
    /// channel if none exists.
    pub async fn enable(&mut self, handle: SessionHandle) -> bool {
        let was_any_enabled = self.registry.any_enabled();

        match self.registry.get_mut(handle) {
            Some(record) if !record.enabled => record.enabled = true,
            _ => return false,
        }

        if !was_any_enabled {
            self.resume().await;
        }
        true
    }

    /// Stop routing frames to the session
    ///
    /// Fails if the handle is stale or the session is already disabled.
    /// Disabling the last enabled session suspends the channel instead of
    /// tearing the registry down.
    pub async fn disable(&mut self, handle: SessionHandle) -> bool {
        match self.registry.get_mut(handle) {
            Some(record) if record.enabled => record.enabled = false,
            _ => return false,
        }

        if !self.registry.any_enabled() {
            self.suspend().await;
        }
        true
    }

    /// Remove the session entirely, regardless of enabled state
    ///
    /// The slot generation is bumped, so the handle (and any copy of it)
    /// goes stale.
    pub async fn remove(&mut self, handle: SessionHandle) -> bool {
        let enabled = match self.registry.get(handle) {
            Some(record) => record.enabled,
            None => return false,
        };

        if enabled {
            if let Some(record) = self.registry.get_mut(handle) {
                record.enabled = false;
            }
            if !self.registry.any_enabled() {
                self.suspend().await;
            }
        }

        self.registry.remove(handle)
    }

    /// Queue one frame for transmission against the session's bound route
    ///
    /// Fails without sending bytes if the session is not registered, not
    /// enabled, or the channel is not open. At most one transmit may be in
    /// flight; a second call while one is pending is rejected with
    /// [`Dnp3Error::TransmitBusy`].
    pub async fn begin_transmit(&mut self, data: &[u8], handle: SessionHandle) -> Dnp3Result<()> {
        let route = match self.registry.get(handle) {
            Some(record) if record.enabled => record.route,
            Some(_) => {
                return Err(Dnp3Error::Link(format!("{} is disabled", handle)));
            }
            None => {
                return Err(Dnp3Error::Link(format!("{} is not registered", handle)));
            }
        };

        if self.transmit_pending {
            return Err(Dnp3Error::TransmitBusy);
        }

        let channel = match self.channel.as_mut() {
            Some(channel) => channel,
            None => return Err(Dnp3Error::ChannelClosed),
        };

        self.transmit_pending = true;
        let result = channel.write(route.outbound_header(), data).await;
        match result {
            Ok(()) => {
                self.transmit_pending = false;
                self.statistics.increment_frames_transmitted();
                Ok(())
            }
            Err(e) => {
                log::warn!("Transmit failed on route {}: {}", route, e);
                self.on_channel_failure().await;
                Err(e)
            }
        }
    }

    /// Install a freshly established channel, replacing any previous one
    pub fn on_new_channel(&mut self, channel: Box<dyn Channel>) {
        self.channel = Some(channel);
        self.transmit_pending = false;
        log::info!("Channel installed");

        if let Some(listener) = self.listener.as_mut() {
            listener.on_channel_open();
        }
        self.registry.for_each_mut(|record| {
            if record.enabled {
                record.session.on_channel_open();
            }
        });
    }

    /// Perform one read-and-route step
    ///
    /// Establishes a channel first if none exists and sessions are
    /// enabled. Channel failures are absorbed: the channel is cleared and
    /// the next call retries, so the caller can pump this in a loop.
    pub async fn process(&mut self) -> Dnp3Result<()> {
        if self.suspended {
            return Ok(());
        }

        if self.channel.is_none() {
            if self.registry.any_enabled() {
                self.start_new_channel().await;
            }
            if self.channel.is_none() {
                return Ok(());
            }
        }

        let result = match self.channel.as_mut() {
            Some(channel) => channel.read().await,
            None => return Ok(()),
        };

        match result {
            Ok(frame) => {
                self.route_frame(frame);
                Ok(())
            }
            Err(e) => {
                log::warn!("Channel failure: {}", e);
                self.on_channel_failure().await;
                Ok(())
            }
        }
    }

    /// Pump the handler until cancelled
    ///
    /// Sleeps while suspended and backs off between reconnection attempts.
    pub async fn run(&mut self) {
        loop {
            if self.suspended {
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }

            let _ = self.process().await;

            if self.channel.is_none() {
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }

    /// Get multiplexer statistics
    pub fn statistics(&self) -> &LinkStatistics {
        &self.statistics
    }

    /// Clear multiplexer statistics
    pub fn clear_statistics(&mut self) {
        self.statistics.clear();
    }

    /// Check whether a channel is currently installed
    pub fn is_channel_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Number of registered sessions
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Get the transport role
    pub fn role(&self) -> ChannelRole {
        self.role
    }

    fn route_frame(&mut self, frame: LinkFrame) {
        match self.registry.find_enabled_mut(&frame.header) {
            Some(record) => {
                record.session.on_frame(frame.header, &frame.payload);
                self.statistics.increment_frames_routed();
            }
            None => {
                log::warn!("No enabled session for inbound frame {}", frame.header);
                self.statistics.increment_frames_discarded();
            }
        }
    }

    async fn resume(&mut self) {
        self.suspended = false;
        if self.channel.is_none() {
            self.start_new_channel().await;
        }
    }

    async fn suspend(&mut self) {
        self.suspended = true;
        match self.role {
            ChannelRole::Active => {
                if let Some(mut channel) = self.channel.take() {
                    let _ = channel.close().await;
                    self.transmit_pending = false;
                    self.notify_channel_closed();
                    log::debug!("Channel closed on suspend");
                }
            }
            ChannelRole::Passive => {
                // The accepted channel stays connected; reads pause until
                // a session is re-enabled.
                log::debug!("Suspended with channel retained");
            }
        }
    }

    async fn start_new_channel(&mut self) {
        match self.connector.connect().await {
            Ok(channel) => self.on_new_channel(channel),
            Err(e) => {
                log::warn!("Channel establishment failed: {}", e);
                self.statistics.increment_connect_failures();
            }
        }
    }

    /// Clear a failed channel; the registry is never destroyed, and the
    /// next `process` call reconnects while sessions remain enabled.
    async fn on_channel_failure(&mut self) {
        self.statistics.increment_channel_failures();
        self.transmit_pending = false;
        if let Some(mut channel) = self.channel.take() {
            let _ = channel.close().await;
        }
        self.notify_channel_closed();
    }

    fn notify_channel_closed(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_channel_closed();
        }
        self.registry.for_each_mut(|record| {
            if record.enabled {
                record.session.on_channel_closed();
            }
        });
    }
}

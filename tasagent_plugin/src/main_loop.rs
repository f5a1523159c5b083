use crate::bot_client::BotApi;
use crate::dispatcher::{self, DispatchOutcome};
use crate::icons::IconSet;
use crate::monitor::{LockdownState, MicState, Monitor, MonitorState};
use crate::protocol::{ActionKind, HostMessage, InboundMsg};
use crate::session::ControlSurface;
use crate::settings::{defaulted_settings, ContextSettingsStore, GlobalSettings, Settings};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Session state shared by the event loop, the poll loop and spawned follow-ups.
/// Each group has its own lock; none is held across an await.
#[derive(Default)]
pub struct PluginState {
    global: RwLock<GlobalSettings>,
    contexts: Mutex<ContextSettingsStore>,
    mic: Monitor<MicState>,
    lockdown: Monitor<LockdownState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorKind {
    Mic,
    Lockdown,
}

/// Work left over after an event has been applied to [`PluginState`].
#[derive(Debug, Clone)]
pub enum FollowUp {
    /// Show the monitor's state as of the push, not as of the event.
    PushIcon {
        monitor: MonitorKind,
        context: String,
    },
    KeyPress {
        action: String,
        context: String,
        settings: Settings,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoSubscribers,
    NoBotUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome<S> {
    Skipped(SkipReason),
    Unchanged(S),
    Changed { state: S, notified: usize, failed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NeverConnected,
    Disconnected,
}

pub struct Plugin<B, C> {
    state: Arc<PluginState>,
    bot: Arc<B>,
    surface: Arc<C>,
    icons: Arc<IconSet>,
}

impl<B, C> Clone for Plugin<B, C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            bot: Arc::clone(&self.bot),
            surface: Arc::clone(&self.surface),
            icons: Arc::clone(&self.icons),
        }
    }
}

impl<B: BotApi, C: ControlSurface> Plugin<B, C> {
    pub fn new(bot: B, surface: C, icons: IconSet) -> Self {
        Self {
            state: Arc::new(PluginState::default()),
            bot: Arc::new(bot),
            surface: Arc::new(surface),
            icons: Arc::new(icons),
        }
    }

    pub fn bot(&self) -> &B {
        &self.bot
    }

    pub fn surface(&self) -> &C {
        &self.surface
    }

    pub fn mic(&self) -> &Monitor<MicState> {
        &self.state.mic
    }

    pub fn lockdown(&self) -> &Monitor<LockdownState> {
        &self.state.lockdown
    }

    pub fn global_settings(&self) -> GlobalSettings {
        self.state
            .global
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn context_settings(&self, context: &str) -> Option<Settings> {
        self.contexts().get(context).map(|e| e.settings.clone())
    }

    fn contexts(&self) -> MutexGuard<'_, ContextSettingsStore> {
        self.state
            .contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies the state change an event implies. Must be called in arrival order;
    /// anything that awaits is returned as a [`FollowUp`].
    pub fn apply(&self, msg: HostMessage) -> Option<FollowUp> {
        match msg {
            HostMessage::WillAppear {
                action,
                context,
                payload,
                ..
            } => {
                self.contexts().upsert(&context, &action, payload.settings);
                match ActionKind::from_uuid(&action) {
                    Some(ActionKind::MicMonitor) => {
                        self.state.mic.subscribe(&context);
                        Some(FollowUp::PushIcon {
                            monitor: MonitorKind::Mic,
                            context,
                        })
                    }
                    Some(ActionKind::LockdownMonitor) => {
                        self.state.lockdown.subscribe(&context);
                        Some(FollowUp::PushIcon {
                            monitor: MonitorKind::Lockdown,
                            context,
                        })
                    }
                    _ => None,
                }
            }
            HostMessage::WillDisappear { context, .. } => {
                self.contexts().remove(&context);
                self.state.mic.unsubscribe(&context);
                self.state.lockdown.unsubscribe(&context);
                None
            }
            HostMessage::DidReceiveSettings {
                action,
                context,
                payload,
                ..
            } => {
                self.contexts().upsert(&context, &action, payload.settings);
                None
            }
            HostMessage::DidReceiveGlobalSettings { payload } => {
                let settings = GlobalSettings::from_host(&payload.settings);
                tracing::info!(
                    "global settings received (bot url {:?}, config path set: {})",
                    settings.bot_url,
                    settings.config_path().is_some()
                );
                *self
                    .state
                    .global
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = settings;
                None
            }
            HostMessage::KeyDown {
                action,
                context,
                payload,
                ..
            } => {
                let settings = self
                    .context_settings(&context)
                    .unwrap_or_else(|| defaulted_settings(&action, payload.settings));
                Some(FollowUp::KeyPress {
                    action,
                    context,
                    settings,
                })
            }
            HostMessage::ApplicationDidLaunch { payload } => {
                tracing::info!("app launch: {}", payload.application);
                None
            }
            HostMessage::ApplicationDidTerminate { payload } => {
                tracing::info!("app terminate: {}", payload.application);
                None
            }
            HostMessage::Other => None,
        }
    }

    /// Pushes the monitor's current icon to one subscriber. Skipped once the
    /// context has gone away.
    pub async fn push_current<S: MonitorState>(&self, monitor: &Monitor<S>, context: &str) {
        let _pushes = monitor.lock_pushes().await;
        if !monitor.is_subscribed(context) {
            return;
        }
        let icon = monitor.state().icon(&self.icons);
        if let Err(e) = self.surface.set_image(context, icon).await {
            tracing::warn!("{} set image for {context} failed: {e}", S::NAME);
        }
    }

    pub async fn follow_up(&self, follow_up: FollowUp) {
        match follow_up {
            FollowUp::PushIcon {
                monitor: MonitorKind::Mic,
                context,
            } => self.push_current(&self.state.mic, &context).await,
            FollowUp::PushIcon {
                monitor: MonitorKind::Lockdown,
                context,
            } => self.push_current(&self.state.lockdown, &context).await,
            FollowUp::KeyPress {
                action,
                context,
                settings,
            } => match self.key_down(&action, &settings).await {
                DispatchOutcome::Sent(status) => {
                    tracing::debug!("{action} on {context} sent, bot answered {status}");
                }
                DispatchOutcome::Failed(e) => {
                    tracing::warn!("{action} on {context} request failed: {e}");
                }
                DispatchOutcome::Dropped(reason) => {
                    tracing::debug!("{action} on {context} dropped: {reason:?}");
                }
            },
        }
    }

    pub async fn key_down(&self, action: &str, settings: &Settings) -> DispatchOutcome {
        let global = self.global_settings();
        let lock_state = self.state.lockdown.state();
        dispatcher::dispatch(&*self.bot, &global, action, settings, lock_state).await
    }

    pub async fn handle_message(&self, msg: HostMessage) {
        if let Some(follow_up) = self.apply(msg) {
            self.follow_up(follow_up).await;
        }
    }

    /// One poll of both monitors, side by side.
    pub async fn tick(&self) -> (TickOutcome<MicState>, TickOutcome<LockdownState>) {
        tokio::join!(self.poll(&self.state.mic), self.poll(&self.state.lockdown))
    }

    pub async fn poll<S: MonitorState>(&self, monitor: &Monitor<S>) -> TickOutcome<S> {
        if !monitor.has_subscribers() {
            return TickOutcome::Skipped(SkipReason::NoSubscribers);
        }
        let Some(base_url) = self.global_settings().base_url() else {
            return TickOutcome::Skipped(SkipReason::NoBotUrl);
        };

        let next = match self.bot.get(&base_url, S::STATUS_PATH).await {
            Ok(resp) => S::from_response(&resp),
            Err(e) => {
                tracing::debug!("{} poll failed: {e}", S::NAME);
                S::no_connection()
            }
        };

        let _pushes = monitor.lock_pushes().await;
        let Some(subscribers) = monitor.transition(next) else {
            return TickOutcome::Unchanged(next);
        };
        tracing::info!("{} state changed to {next:?}", S::NAME);

        let icon = next.icon(&self.icons);
        let mut failed = 0;
        for context in &subscribers {
            if let Err(e) = self.surface.set_image(context, icon).await {
                failed += 1;
                tracing::warn!("{} set image for {context} failed: {e}", S::NAME);
            }
        }

        TickOutcome::Changed {
            state: next,
            notified: subscribers.len(),
            failed,
        }
    }

    /// Polls each monitor on its own [`POLL_INTERVAL`] ticker until `shutdown` flips
    /// or its sender goes away. A stalled request holds up only its own monitor.
    pub async fn poll_loop(self, shutdown: watch::Receiver<bool>) {
        tokio::join!(
            self.monitor_loop(&self.state.mic, shutdown.clone()),
            self.monitor_loop(&self.state.lockdown, shutdown),
        );
        tracing::debug!("poll loop stopped");
    }

    /// An in-flight poll is abandoned on shutdown.
    async fn monitor_loop<S: MonitorState>(
        &self,
        monitor: &Monitor<S>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            tokio::select! {
                _ = self.poll(monitor) => {}
                _ = shutdown.changed() => break,
            }
        }
        tracing::debug!("{} polling stopped", S::NAME);
    }

    /// Drives the plugin until the host goes away.
    pub async fn run(self, mut events: mpsc::Receiver<InboundMsg>) -> RunOutcome {
        let connected = tokio::time::timeout(CONNECT_TIMEOUT, wait_for_connect(&mut events)).await;
        if !matches!(connected, Ok(true)) {
            tracing::warn!("host did not connect within {CONNECT_TIMEOUT:?}");
            return RunOutcome::NeverConnected;
        }

        if let Err(e) = self.surface.request_global_settings().await {
            tracing::warn!("global settings request failed: {e}");
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller = tokio::spawn(self.clone().poll_loop(shutdown_rx));

        while let Some(msg) = events.recv().await {
            match msg {
                InboundMsg::Host(msg) => {
                    if let Some(follow_up) = self.apply(msg) {
                        let plugin = self.clone();
                        tokio::spawn(async move { plugin.follow_up(follow_up).await });
                    }
                }
                InboundMsg::Connected => {}
                InboundMsg::Disconnected => break,
            }
        }

        let _ = shutdown_tx.send(true);
        if let Err(e) = poller.await {
            tracing::warn!("poll loop task failed: {e}");
        }
        tracing::info!("host disconnected, shutting down");
        RunOutcome::Disconnected
    }
}

async fn wait_for_connect(events: &mut mpsc::Receiver<InboundMsg>) -> bool {
    while let Some(msg) = events.recv().await {
        match msg {
            InboundMsg::Connected => return true,
            InboundMsg::Disconnected => return false,
            InboundMsg::Host(_) => {}
        }
    }
    false
}

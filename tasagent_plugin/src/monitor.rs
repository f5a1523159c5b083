use crate::bot_client::BotResponse;
use crate::icons::{Icon, IconSet};
use crate::protocol::{EffectStatus, LockdownStatus, LOCKDOWN_PATH, MIC_EFFECT_PATH};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MicState {
    #[default]
    NoConnection,
    Normal,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockdownState {
    #[default]
    NoConnection,
    Open,
    Locked,
}

impl LockdownState {
    /// Value to request on key-press: unlock only when currently locked.
    pub fn toggled_request(self) -> bool {
        match self {
            LockdownState::Locked => false,
            LockdownState::Open | LockdownState::NoConnection => true,
        }
    }
}

/// A remote state mirrored onto monitor buttons.
pub trait MonitorState: Copy + Eq + Debug + Default + Send + Sync + 'static {
    const NAME: &'static str;
    const STATUS_PATH: &'static str;

    /// Unreachable bot or failed request.
    fn no_connection() -> Self;

    /// Total over every status/body combination.
    fn from_response(response: &BotResponse) -> Self;

    fn icon(self, icons: &IconSet) -> &Icon;
}

impl MonitorState for MicState {
    const NAME: &'static str = "mic";
    const STATUS_PATH: &'static str = MIC_EFFECT_PATH;

    fn no_connection() -> Self {
        MicState::NoConnection
    }

    fn from_response(response: &BotResponse) -> Self {
        if !response.is_ok() {
            return MicState::NoConnection;
        }
        // A 200 that is not JSON is not a bot we understand.
        if serde_json::from_str::<Value>(&response.body).is_err() {
            return MicState::NoConnection;
        }
        let status: EffectStatus = response.json().unwrap_or_default();
        let effect = status.effect.unwrap_or_default();
        let effect = effect.trim();
        if effect.is_empty() || effect.eq_ignore_ascii_case("none") {
            MicState::Normal
        } else {
            MicState::Modified
        }
    }

    fn icon(self, icons: &IconSet) -> &Icon {
        match self {
            MicState::NoConnection => &icons.mic_no_connection,
            MicState::Normal => &icons.mic_normal,
            MicState::Modified => &icons.mic_modified,
        }
    }
}

impl MonitorState for LockdownState {
    const NAME: &'static str = "lockdown";
    const STATUS_PATH: &'static str = LOCKDOWN_PATH;

    fn no_connection() -> Self {
        LockdownState::NoConnection
    }

    fn from_response(response: &BotResponse) -> Self {
        if !response.is_ok() {
            return LockdownState::NoConnection;
        }
        if serde_json::from_str::<Value>(&response.body).is_err() {
            return LockdownState::NoConnection;
        }
        let status: LockdownStatus = response.json().unwrap_or_default();
        if status.locked {
            LockdownState::Locked
        } else {
            LockdownState::Open
        }
    }

    fn icon(self, icons: &IconSet) -> &Icon {
        match self {
            LockdownState::NoConnection => &icons.lock_no_connection,
            LockdownState::Open => &icons.lock_open,
            LockdownState::Locked => &icons.lock_locked,
        }
    }
}

#[derive(Debug, Default)]
struct MonitorInner<S> {
    state: S,
    subscribers: BTreeSet<String>,
}

/// One monitor's stored state plus the contexts displaying it, under a single lock.
/// Icon pushes for the monitor are serialized through `pushes` so a stale image
/// never lands after a newer one.
#[derive(Debug, Default)]
pub struct Monitor<S> {
    inner: Mutex<MonitorInner<S>>,
    pushes: tokio::sync::Mutex<()>,
}

impl<S: MonitorState> Monitor<S> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MonitorInner {
                state: S::no_connection(),
                subscribers: BTreeSet::new(),
            }),
            pushes: tokio::sync::Mutex::new(()),
        }
    }

    /// Held while an icon is pushed. State transitions that fan out take it too.
    pub async fn lock_pushes(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.pushes.lock().await
    }

    fn lock(&self) -> MutexGuard<'_, MonitorInner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `context` and returns the state it should display right away.
    pub fn subscribe(&self, context: &str) -> S {
        let mut inner = self.lock();
        inner.subscribers.insert(context.to_string());
        inner.state
    }

    pub fn unsubscribe(&self, context: &str) -> bool {
        self.lock().subscribers.remove(context)
    }

    pub fn is_subscribed(&self, context: &str) -> bool {
        self.lock().subscribers.contains(context)
    }

    pub fn has_subscribers(&self) -> bool {
        !self.lock().subscribers.is_empty()
    }

    pub fn subscribers(&self) -> Vec<String> {
        self.lock().subscribers.iter().cloned().collect()
    }

    pub fn state(&self) -> S {
        self.lock().state
    }

    /// Stores `next`. On a change, returns the subscribers to notify, snapshotted under the lock.
    pub fn transition(&self, next: S) -> Option<Vec<String>> {
        let mut inner = self.lock();
        if inner.state == next {
            return None;
        }
        inner.state = next;
        Some(inner.subscribers.iter().cloned().collect())
    }
}

pub mod bot_client;
pub mod config;
pub mod dispatcher;
pub mod icons;
pub mod main_loop;
pub mod monitor;
pub mod protocol;
pub mod session;
pub mod settings;

pub use crate::bot_client::{BotApi, BotClient, BotError, BotResponse};
pub use crate::dispatcher::{BotRequest, DispatchOutcome, DropReason};
pub use crate::icons::{Icon, IconSet};
pub use crate::main_loop::{FollowUp, MonitorKind, Plugin, RunOutcome, SkipReason, TickOutcome};
pub use crate::monitor::{LockdownState, MicState, Monitor, MonitorState};
pub use crate::protocol::{InboundMsg, OutboundMsg, INBOUND_CAP, OUTBOUND_CAP};
pub use crate::session::{ControlSurface, SessionConfig, SessionError, SessionHandle};

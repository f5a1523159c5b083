pub const INBOUND_CAP: usize = 256;
pub const OUTBOUND_CAP: usize = 256;

pub enum InboundMsg {
    Connected,
    Disconnected,
    Host(HostMessage),
}

pub enum OutboundMsg {
    Send { cmd: PluginCommand },
}

pub use tasagent_protocol::{
    ActionKind, EffectRequest, EffectStatus, HostMessage, LockdownStatus, PluginCommand,
    Registration, SetImagePayload, LOCKDOWN_PATH, MIC_EFFECT_PATH, SFX_PLAY_IMMEDIATE_PATH,
    TARGET_HARDWARE_AND_SOFTWARE,
};

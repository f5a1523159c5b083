use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MIC_EFFECT_PATH: &str = "/TASagentBotAPI/Mic/Effect";
pub const SFX_PLAY_IMMEDIATE_PATH: &str = "/TASagentBotAPI/SFX/PlayImmediate";
pub const LOCKDOWN_PATH: &str = "/TASagentBotAPI/Auth/Lockdown";

/// `target` value for setImage meaning "hardware and software".
pub const TARGET_HARDWARE_AND_SOFTWARE: u8 = 0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    #[serde(rename = "wtf.tas.tasagentbot.vfx")]
    Vfx,
    #[serde(rename = "wtf.tas.tasagentbot.sfx")]
    Sfx,
    #[serde(rename = "wtf.tas.tasagentbot.rest")]
    Rest,
    #[serde(rename = "wtf.tas.tasagentbot.micmonitor")]
    MicMonitor,
    #[serde(rename = "wtf.tas.tasagentbot.lockdownmonitor")]
    LockdownMonitor,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Vfx,
        ActionKind::Sfx,
        ActionKind::Rest,
        ActionKind::MicMonitor,
        ActionKind::LockdownMonitor,
    ];

    pub fn uuid(self) -> &'static str {
        match self {
            ActionKind::Vfx => "wtf.tas.tasagentbot.vfx",
            ActionKind::Sfx => "wtf.tas.tasagentbot.sfx",
            ActionKind::Rest => "wtf.tas.tasagentbot.rest",
            ActionKind::MicMonitor => "wtf.tas.tasagentbot.micmonitor",
            ActionKind::LockdownMonitor => "wtf.tas.tasagentbot.lockdownmonitor",
        }
    }

    pub fn from_uuid(uuid: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.uuid() == uuid)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ActionPayload {
    #[serde(default)]
    pub settings: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GlobalSettingsPayload {
    #[serde(default)]
    pub settings: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApplicationPayload {
    pub application: String,
}

/// Events pushed by the host over the control channel.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum HostMessage {
    WillAppear {
        action: String,
        context: String,
        #[serde(default)]
        device: String,
        #[serde(default)]
        payload: ActionPayload,
    },
    WillDisappear {
        action: String,
        context: String,
        #[serde(default)]
        device: String,
        #[serde(default)]
        payload: ActionPayload,
    },
    DidReceiveSettings {
        action: String,
        context: String,
        #[serde(default)]
        device: String,
        #[serde(default)]
        payload: ActionPayload,
    },
    KeyDown {
        action: String,
        context: String,
        #[serde(default)]
        device: String,
        #[serde(default)]
        payload: ActionPayload,
    },
    DidReceiveGlobalSettings {
        #[serde(default)]
        payload: GlobalSettingsPayload,
    },
    ApplicationDidLaunch {
        payload: ApplicationPayload,
    },
    ApplicationDidTerminate {
        payload: ApplicationPayload,
    },
    #[serde(other)]
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SetImagePayload {
    pub image: String,
    pub target: u8,
}

/// Commands the plugin sends to the host.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum PluginCommand {
    SetImage {
        context: String,
        payload: SetImagePayload,
    },
    GetGlobalSettings {
        context: String,
    },
}

/// First frame after the socket opens; `event` is the launch-supplied register event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub event: String,
    pub uuid: String,
}

// Bot REST bodies. The bot may answer in camelCase, so both spellings are accepted.

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct EffectRequest {
    #[serde(alias = "effect")]
    pub effect: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct EffectStatus {
    #[serde(default, alias = "effect")]
    pub effect: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct LockdownStatus {
    #[serde(default, alias = "locked")]
    pub locked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_uuids_round_trip_through_lookup() {
        for action in ActionKind::ALL {
            assert_eq!(ActionKind::from_uuid(action.uuid()), Some(action));
        }
        assert_eq!(ActionKind::from_uuid("wtf.tas.tasagentbot.unknown"), None);
    }

    #[test]
    fn decodes_will_appear_without_settings() {
        let raw = json!({
            "event": "willAppear",
            "action": "wtf.tas.tasagentbot.vfx",
            "context": "C1",
            "device": "D1",
            "payload": { "coordinates": { "column": 0, "row": 1 }, "isInMultiAction": false }
        });
        let msg: HostMessage = serde_json::from_value(raw).unwrap();
        match msg {
            HostMessage::WillAppear {
                action,
                context,
                payload,
                ..
            } => {
                assert_eq!(action, ActionKind::Vfx.uuid());
                assert_eq!(context, "C1");
                assert!(payload.settings.is_null());
            }
            other => panic!("expected willAppear, got {other:?}"),
        }
    }

    #[test]
    fn unknown_events_decode_as_other() {
        let raw = json!({ "event": "deviceDidConnect", "device": "D1", "deviceInfo": {} });
        let msg: HostMessage = serde_json::from_value(raw).unwrap();
        assert!(matches!(msg, HostMessage::Other));
    }

    #[test]
    fn set_image_uses_host_field_names() {
        let cmd = PluginCommand::SetImage {
            context: "C2".to_string(),
            payload: SetImagePayload {
                image: "data:image/png;base64,AA==".to_string(),
                target: TARGET_HARDWARE_AND_SOFTWARE,
            },
        };
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({
                "event": "setImage",
                "context": "C2",
                "payload": { "image": "data:image/png;base64,AA==", "target": 0 }
            })
        );
    }

    #[test]
    fn bot_status_accepts_either_casing() {
        let a: LockdownStatus = serde_json::from_str(r#"{"locked":true}"#).unwrap();
        let b: LockdownStatus = serde_json::from_str(r#"{"Locked":true}"#).unwrap();
        assert_eq!(a, b);

        let e: EffectStatus = serde_json::from_str(r#"{"effect":"Sephiroth"}"#).unwrap();
        assert_eq!(e.effect.as_deref(), Some("Sephiroth"));
        assert_eq!(
            serde_json::to_string(&EffectRequest {
                effect: "None".to_string()
            })
            .unwrap(),
            r#"{"Effect":"None"}"#
        );
    }
}

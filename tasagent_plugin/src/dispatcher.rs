use crate::bot_client::{normalize_path, BotApi, BotError};
use crate::config::load_bot_configuration;
use crate::monitor::LockdownState;
use crate::protocol::{
    ActionKind, EffectRequest, LockdownStatus, LOCKDOWN_PATH, MIC_EFFECT_PATH,
    SFX_PLAY_IMMEDIATE_PATH,
};
use crate::settings::{
    setting_str, GlobalSettings, Settings, KEY_END_POINT, KEY_JSON_BODY, KEY_SOUND_EFFECT,
    KEY_VOICE_EFFECT,
};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct BotRequest {
    pub path: String,
    pub body: Value,
}

impl BotRequest {
    fn json<T: Serialize>(path: &str, body: &T) -> Result<Self, DropReason> {
        let body = serde_json::to_value(body).map_err(|_| DropReason::InvalidJsonBody)?;
        Ok(Self {
            path: path.to_string(),
            body,
        })
    }
}

/// Why a key-press produced no request. None of these reach the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingBotUrl,
    MissingConfigPath,
    ConfigUnavailable,
    MissingAuth,
    UnknownAction,
    MissingSetting(&'static str),
    InvalidJsonBody,
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Sent(StatusCode),
    Failed(BotError),
    Dropped(DropReason),
}

fn required<'a>(settings: &'a Settings, key: &'static str) -> Result<&'a str, DropReason> {
    setting_str(settings, key).ok_or(DropReason::MissingSetting(key))
}

/// Maps a pressed action to the single request it triggers.
pub fn plan_request(
    action: ActionKind,
    settings: &Settings,
    lock_state: LockdownState,
) -> Result<BotRequest, DropReason> {
    match action {
        ActionKind::Vfx => BotRequest::json(
            MIC_EFFECT_PATH,
            &EffectRequest {
                effect: required(settings, KEY_VOICE_EFFECT)?.to_string(),
            },
        ),
        ActionKind::Sfx => BotRequest::json(
            SFX_PLAY_IMMEDIATE_PATH,
            &EffectRequest {
                effect: required(settings, KEY_SOUND_EFFECT)?.to_string(),
            },
        ),
        ActionKind::Rest => {
            let end_point = required(settings, KEY_END_POINT)?;
            let raw_body = required(settings, KEY_JSON_BODY)?;
            // The bot only takes object bodies.
            let body: Map<String, Value> =
                serde_json::from_str(raw_body).map_err(|_| DropReason::InvalidJsonBody)?;
            Ok(BotRequest {
                path: normalize_path(end_point),
                body: Value::Object(body),
            })
        }
        ActionKind::MicMonitor => BotRequest::json(
            MIC_EFFECT_PATH,
            &EffectRequest {
                effect: "None".to_string(),
            },
        ),
        ActionKind::LockdownMonitor => BotRequest::json(
            LOCKDOWN_PATH,
            &LockdownStatus {
                locked: lock_state.toggled_request(),
            },
        ),
    }
}

/// Runs one key-press end to end: preconditions, credential reload, request.
pub async fn dispatch<B: BotApi>(
    bot: &B,
    global: &GlobalSettings,
    action: &str,
    settings: &Settings,
    lock_state: LockdownState,
) -> DispatchOutcome {
    let Some(base_url) = global.base_url() else {
        return DispatchOutcome::Dropped(DropReason::MissingBotUrl);
    };
    let Some(config_path) = global.config_path() else {
        return DispatchOutcome::Dropped(DropReason::MissingConfigPath);
    };

    let config = match load_bot_configuration(Path::new(config_path)).await {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("key press dropped: {e}");
            return DispatchOutcome::Dropped(DropReason::ConfigUnavailable);
        }
    };
    let Some(auth) = config.admin_auth() else {
        return DispatchOutcome::Dropped(DropReason::MissingAuth);
    };

    let Some(action) = ActionKind::from_uuid(action) else {
        return DispatchOutcome::Dropped(DropReason::UnknownAction);
    };
    let request = match plan_request(action, settings, lock_state) {
        Ok(r) => r,
        Err(reason) => return DispatchOutcome::Dropped(reason),
    };

    match bot.post(&base_url, &request.path, auth, &request.body).await {
        Ok(resp) => DispatchOutcome::Sent(resp.status),
        Err(e) => DispatchOutcome::Failed(e),
    }
}

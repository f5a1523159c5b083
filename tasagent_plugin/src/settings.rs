use crate::bot_client::normalize_base_url;
use crate::protocol::ActionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

pub type Settings = Map<String, Value>;

pub const DEFAULT_BOT_URL: &str = "http://localhost:5000";
pub const DEFAULT_VOICE_EFFECT: &str = "none";
pub const DEFAULT_SOUND_EFFECT: &str = "sephiroth";
pub const DEFAULT_REST_ENDPOINT: &str = "/TASagentBotAPI/SFX/Skip";
pub const DEFAULT_REST_BODY: &str = "{ \"effect\": \"None\" }";

pub const KEY_VOICE_EFFECT: &str = "voiceEffect";
pub const KEY_SOUND_EFFECT: &str = "soundEffect";
pub const KEY_END_POINT: &str = "endPoint";
pub const KEY_JSON_BODY: &str = "jsonBody";

fn default_bot_url() -> String {
    DEFAULT_BOT_URL.to_string()
}

/// Plugin-wide settings shared by every button. Empty until the host answers
/// `getGlobalSettings`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalSettings {
    #[serde(rename = "botURL", alias = "botBaseURL", default = "default_bot_url")]
    pub bot_url: String,
    #[serde(rename = "configFilePath", default)]
    pub config_file_path: String,
}

impl GlobalSettings {
    /// Builds settings from the host payload, defaulting missing keys.
    pub fn from_host(settings: &Value) -> Self {
        match settings {
            Value::Object(_) => serde_json::from_value(settings.clone()).unwrap_or_else(|_| {
                tracing::debug!("global settings had unexpected types, using defaults");
                Self::defaulted()
            }),
            _ => Self::defaulted(),
        }
    }

    pub fn defaulted() -> Self {
        Self {
            bot_url: default_bot_url(),
            config_file_path: String::new(),
        }
    }

    pub fn base_url(&self) -> Option<String> {
        normalize_base_url(&self.bot_url)
    }

    pub fn config_path(&self) -> Option<&str> {
        let p = self.config_file_path.trim();
        if p.is_empty() {
            None
        } else {
            Some(p)
        }
    }
}

/// Non-empty string value for `key`, if any.
pub fn setting_str<'a>(settings: &'a Settings, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn fill(settings: &mut Settings, key: &str, default: &str) {
    if setting_str(settings, key).is_none() {
        settings.insert(key.to_string(), Value::String(default.to_string()));
    }
}

/// Fills every key the action needs. Idempotent; monitors and unknown actions are untouched.
pub fn fill_defaults(action: Option<ActionKind>, settings: &mut Settings) {
    match action {
        Some(ActionKind::Vfx) => fill(settings, KEY_VOICE_EFFECT, DEFAULT_VOICE_EFFECT),
        Some(ActionKind::Sfx) => fill(settings, KEY_SOUND_EFFECT, DEFAULT_SOUND_EFFECT),
        Some(ActionKind::Rest) => {
            fill(settings, KEY_END_POINT, DEFAULT_REST_ENDPOINT);
            fill(settings, KEY_JSON_BODY, DEFAULT_REST_BODY);
        }
        Some(ActionKind::MicMonitor) | Some(ActionKind::LockdownMonitor) | None => {}
    }
}

/// Host payloads may carry `null` or omit settings entirely.
pub fn settings_from_value(value: Value) -> Settings {
    match value {
        Value::Object(map) => map,
        _ => Settings::new(),
    }
}

pub fn defaulted_settings(action: &str, value: Value) -> Settings {
    let mut settings = settings_from_value(value);
    fill_defaults(ActionKind::from_uuid(action), &mut settings);
    settings
}

#[derive(Debug, Clone)]
pub struct ContextEntry {
    pub action: String,
    pub settings: Settings,
}

#[derive(Debug, Default)]
pub struct ContextSettingsStore {
    entries: HashMap<String, ContextEntry>,
}

impl ContextSettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was stored for `context` and returns the defaulted settings.
    pub fn upsert(&mut self, context: &str, action: &str, settings: Value) -> &Settings {
        let entry = ContextEntry {
            action: action.to_string(),
            settings: defaulted_settings(action, settings),
        };
        match self.entries.entry(context.to_string()) {
            Entry::Occupied(mut slot) => {
                slot.insert(entry);
                &slot.into_mut().settings
            }
            Entry::Vacant(slot) => &slot.insert(entry).settings,
        }
    }

    pub fn remove(&mut self, context: &str) -> Option<ContextEntry> {
        self.entries.remove(context)
    }

    pub fn get(&self, context: &str) -> Option<&ContextEntry> {
        self.entries.get(context)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#![allow(dead_code)]

use reqwest::StatusCode;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tasagent_plugin::protocol::HostMessage;
use tasagent_plugin::{BotApi, BotError, BotResponse, ControlSurface, Icon, IconSet, SessionError};

pub const BOT_URL: &str = "http://bot.test";

#[derive(Debug, Clone, PartialEq)]
pub struct BotCall {
    pub method: &'static str,
    pub base_url: String,
    pub path: String,
    pub auth: Option<String>,
    pub body: Option<Value>,
}

/// Records every call. GETs without a configured answer get a 503; GETs to a
/// hung path never complete.
#[derive(Default)]
pub struct MockBot {
    responses: Mutex<HashMap<String, (StatusCode, String)>>,
    hung: Mutex<HashSet<String>>,
    calls: Mutex<Vec<BotCall>>,
}

impl MockBot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, status: StatusCode, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn hang(&self, path: &str) {
        self.hung.lock().unwrap().insert(path.to_string());
    }

    pub fn gets(&self, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == "GET" && c.path == path)
            .count()
    }

    pub fn forget(&self, path: &str) {
        self.responses.lock().unwrap().remove(path);
    }

    pub fn calls(&self) -> Vec<BotCall> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, path: &str, fallback: StatusCode) -> BotResponse {
        let responses = self.responses.lock().unwrap();
        match responses.get(path) {
            Some((status, body)) => BotResponse::new(*status, body.clone()),
            None => BotResponse::new(fallback, ""),
        }
    }
}

impl BotApi for MockBot {
    async fn post(
        &self,
        base_url: &str,
        path: &str,
        auth: &str,
        body: &Value,
    ) -> Result<BotResponse, BotError> {
        self.calls.lock().unwrap().push(BotCall {
            method: "POST",
            base_url: base_url.to_string(),
            path: path.to_string(),
            auth: Some(auth.to_string()),
            body: Some(body.clone()),
        });
        Ok(self.answer(path, StatusCode::OK))
    }

    async fn get(&self, base_url: &str, path: &str) -> Result<BotResponse, BotError> {
        self.calls.lock().unwrap().push(BotCall {
            method: "GET",
            base_url: base_url.to_string(),
            path: path.to_string(),
            auth: None,
            body: None,
        });
        let hung = self.hung.lock().unwrap().contains(path);
        if hung {
            std::future::pending::<()>().await;
        }
        Ok(self.answer(path, StatusCode::SERVICE_UNAVAILABLE))
    }
}

/// Records every image push; contexts in `failing` still get recorded but return an error.
#[derive(Default)]
pub struct MockSurface {
    images: Mutex<Vec<(String, Icon)>>,
    failing: Mutex<HashSet<String>>,
    global_requests: AtomicUsize,
}

impl MockSurface {
    pub fn fail_for(&self, context: &str) {
        self.failing.lock().unwrap().insert(context.to_string());
    }

    pub fn images(&self) -> Vec<(String, Icon)> {
        self.images.lock().unwrap().clone()
    }

    pub fn global_requests(&self) -> usize {
        self.global_requests.load(Ordering::SeqCst)
    }
}

impl ControlSurface for MockSurface {
    async fn set_image(&self, context: &str, image: &Icon) -> Result<(), SessionError> {
        self.images
            .lock()
            .unwrap()
            .push((context.to_string(), image.clone()));
        if self.failing.lock().unwrap().contains(context) {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    async fn request_global_settings(&self) -> Result<(), SessionError> {
        self.global_requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn test_icons() -> IconSet {
    IconSet {
        mic_no_connection: Icon::from_data_uri("icon:mic-no-connection"),
        mic_normal: Icon::from_data_uri("icon:mic-normal"),
        mic_modified: Icon::from_data_uri("icon:mic-modified"),
        lock_no_connection: Icon::from_data_uri("icon:lock-no-connection"),
        lock_open: Icon::from_data_uri("icon:lock-open"),
        lock_locked: Icon::from_data_uri("icon:lock-locked"),
    }
}

pub fn host(value: Value) -> HostMessage {
    serde_json::from_value(value).expect("valid host message")
}

/// Writes a bot config file with the given admin credential to a fresh temp path.
pub fn write_config(auth: &str) -> PathBuf {
    static SEQ: AtomicUsize = AtomicUsize::new(0);
    let n = SEQ.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "tasagent_plugin_test_{}_{n}.json",
        std::process::id()
    ));
    rewrite_config(&path, auth);
    path
}

pub fn rewrite_config(path: &Path, auth: &str) {
    let body = serde_json::json!({
        "AuthConfiguration": { "Admin": { "AuthString": auth } }
    });
    std::fs::write(path, body.to_string()).expect("write temp config");
}

use crate::icons::Icon;
use crate::protocol::{
    HostMessage, InboundMsg, OutboundMsg, PluginCommand, Registration, SetImagePayload,
    INBOUND_CAP, OUTBOUND_CAP, TARGET_HARDWARE_AND_SOFTWARE,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type HostSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("host session closed")]
    Closed,
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Outbound half of the host channel, as seen by the rest of the plugin.
pub trait ControlSurface: Send + Sync + 'static {
    fn set_image(
        &self,
        context: &str,
        image: &Icon,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn request_global_settings(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// Launch parameters handed over by the host.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub port: u16,
    pub plugin_uuid: String,
    pub register_event: String,
}

impl SessionConfig {
    pub fn url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }
}

#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<OutboundMsg>,
    plugin_uuid: Arc<str>,
}

impl SessionHandle {
    async fn send(&self, cmd: PluginCommand) -> Result<(), SessionError> {
        self.tx
            .send(OutboundMsg::Send { cmd })
            .await
            .map_err(|_| SessionError::Closed)
    }
}

impl ControlSurface for SessionHandle {
    async fn set_image(&self, context: &str, image: &Icon) -> Result<(), SessionError> {
        self.send(PluginCommand::SetImage {
            context: context.to_string(),
            payload: SetImagePayload {
                image: image.as_str().to_string(),
                target: TARGET_HARDWARE_AND_SOFTWARE,
            },
        })
        .await
    }

    async fn request_global_settings(&self) -> Result<(), SessionError> {
        self.send(PluginCommand::GetGlobalSettings {
            context: self.plugin_uuid.to_string(),
        })
        .await
    }
}

/// Starts the socket actor. Events arrive on the returned receiver; `Disconnected` is
/// always the last one.
pub fn spawn(config: SessionConfig) -> (SessionHandle, mpsc::Receiver<InboundMsg>) {
    let (in_tx, in_rx) = mpsc::channel(INBOUND_CAP);
    let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CAP);

    let handle = SessionHandle {
        tx: out_tx,
        plugin_uuid: config.plugin_uuid.as_str().into(),
    };
    tokio::spawn(run(config, out_rx, in_tx));
    (handle, in_rx)
}

async fn run(
    config: SessionConfig,
    mut out_rx: mpsc::Receiver<OutboundMsg>,
    in_tx: mpsc::Sender<InboundMsg>,
) {
    let url = config.url();
    let mut socket = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((socket, _)) => socket,
        Err(e) => {
            tracing::warn!("host connect to {url} failed: {e}");
            let _ = in_tx.send(InboundMsg::Disconnected).await;
            return;
        }
    };

    let registration = Registration {
        event: config.register_event.clone(),
        uuid: config.plugin_uuid.clone(),
    };
    if let Err(e) = send_json(&mut socket, &registration).await {
        tracing::warn!("host registration failed: {e}");
        let _ = in_tx.send(InboundMsg::Disconnected).await;
        return;
    }

    tracing::info!("connected to host at {url}");
    if in_tx.send(InboundMsg::Connected).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            out = out_rx.recv() => {
                match out {
                    Some(OutboundMsg::Send { cmd }) => {
                        if let Err(e) = send_json(&mut socket, &cmd).await {
                            tracing::warn!("host send failed: {e}");
                            break;
                        }
                    }
                    None => {
                        let _ = socket.close(None).await;
                        break;
                    }
                }
            }
            incoming = socket.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<HostMessage>(text.as_str()) {
                            Ok(HostMessage::Other) => {}
                            Ok(msg) => {
                                if in_tx.send(InboundMsg::Host(msg)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => tracing::debug!("ignoring undecodable host frame: {e}"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("host socket error: {e}");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("host session ended");
    let _ = in_tx.send(InboundMsg::Disconnected).await;
}

async fn send_json<T: Serialize>(ws: &mut HostSocket, msg: &T) -> Result<(), SessionError> {
    let payload = serde_json::to_string(msg)?;
    ws.send(Message::Text(payload.into())).await?;
    Ok(())
}

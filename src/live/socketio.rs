use anyhow::{bail, Context};
use async_tungstenite::tungstenite::Message;
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::{mpsc::UnboundedSender, oneshot};
use url::Url;

use super::packet::{EnginePacket, SocketKind, SocketPacket, DEFAULT_NAMESPACE};
use super::{LiveUpdates, Signal, Subscription, DISH_UPDATED_EVENT};

/// Socket.IO (v4, websocket transport only) client for the dish update feed.
#[derive(Debug, Clone)]
pub struct SocketIoChannel {
    url: Url,
}

impl SocketIoChannel {
    /// `base` is the same http(s) base url the REST api lives under.
    pub fn new(base: &Url) -> anyhow::Result<Self> {
        Ok(Self {
            url: socket_url(base)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl LiveUpdates for SocketIoChannel {
    fn subscribe(&self, signals: UnboundedSender<Signal>) -> Subscription {
        let (close_tx, close_rx) = oneshot::channel();
        let url = self.url.clone();

        tokio::spawn(async move {
            if let Err(e) = run_session(&url, signals, close_rx).await {
                tracing::error!("live update channel {url} failed: {e:#}");
            }
        });

        Subscription::new(move || {
            // the session may already be gone, nothing to close then
            let _ = close_tx.send(());
        })
    }
}

fn socket_url(base: &Url) -> anyhow::Result<Url> {
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => bail!("unsupported scheme {other} for live updates"),
    };

    let mut url = base.clone();
    url.set_scheme(scheme)
        .map_err(|_| anyhow::anyhow!("fail to switch {base} to {scheme}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("base url {base} can not carry a path"))?
        .pop_if_empty()
        .extend(["socket.io", ""]);
    url.set_query(Some("EIO=4&transport=websocket"));
    url.set_fragment(None);
    Ok(url)
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

async fn run_session(
    url: &Url,
    signals: UnboundedSender<Signal>,
    mut close_rx: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let (mut ws, _) = tokio::select! {
        conn = async_tungstenite::tokio::connect_async(url.as_str()) => {
            conn.with_context(|| format!("fail to connect to {url}"))?
        }
        _ = &mut close_rx => {
            tracing::debug!("live update channel closed before connecting");
            return Ok(());
        }
    };
    tracing::debug!("websocket to {url} established");

    loop {
        tokio::select! {
            _ = &mut close_rx => {
                send(&mut ws, EnginePacket::Message(SocketPacket::disconnect())).await?;
                if let Err(e) = ws.close(None).await {
                    tracing::debug!("fail to close websocket cleanly: {e}");
                }
                tracing::info!("disconnected from live update channel");
                return Ok(());
            }
            frame = ws.next() => {
                let Some(frame) = frame else {
                    tracing::info!("live update server went away");
                    return Ok(());
                };
                match frame.context("fail to read from live update channel")? {
                    Message::Text(text) => {
                        if handle_packet(&mut ws, text.as_str(), &signals).await? == Flow::Stop {
                            return Ok(());
                        }
                    }
                    Message::Close(_) => {
                        tracing::info!("live update server closed the websocket");
                        return Ok(());
                    }
                    // websocket level ping/pong is answered by tungstenite
                    _ => {}
                }
            }
        }
    }
}

async fn handle_packet<S>(
    ws: &mut S,
    raw: &str,
    signals: &UnboundedSender<Signal>,
) -> anyhow::Result<Flow>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let packet = match EnginePacket::decode(raw) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::warn!("ignore malformed packet: {e:#}");
            return Ok(Flow::Continue);
        }
    };

    match packet {
        EnginePacket::Open(handshake) => {
            tracing::debug!("engine.io session opened: {handshake}");
            send(ws, EnginePacket::Message(SocketPacket::connect())).await?;
        }
        EnginePacket::Ping(data) => send(ws, EnginePacket::Pong(data)).await?,
        EnginePacket::Close => {
            tracing::info!("live update server closed the session");
            return Ok(Flow::Stop);
        }
        EnginePacket::Message(packet) if packet.namespace == DEFAULT_NAMESPACE => {
            let signal = match packet.kind {
                SocketKind::Connect => Signal::Connected,
                SocketKind::Event | SocketKind::BinaryEvent => match packet.event_name() {
                    Some(DISH_UPDATED_EVENT) => Signal::DishUpdated,
                    other => {
                        tracing::debug!("ignore event {other:?}");
                        return Ok(Flow::Continue);
                    }
                },
                SocketKind::Disconnect => {
                    tracing::info!("live update server dropped the namespace");
                    return Ok(Flow::Stop);
                }
                SocketKind::ConnectError => {
                    let reason = packet.data.map(|d| d.to_string()).unwrap_or_default();
                    bail!("server refused the live update connection: {reason}");
                }
                SocketKind::Ack | SocketKind::BinaryAck => return Ok(Flow::Continue),
            };
            if signals.send(signal).is_err() {
                tracing::debug!("nobody listens for live updates anymore");
                return Ok(Flow::Stop);
            }
        }
        other => tracing::trace!("ignore packet {other:?}"),
    }

    Ok(Flow::Continue)
}

async fn send<S>(ws: &mut S, packet: EnginePacket) -> anyhow::Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    ws.send(Message::text(packet.encode()))
        .await
        .context("fail to write to live update channel")
}

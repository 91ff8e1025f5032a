use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use async_tungstenite::tungstenite::Message;
use async_tungstenite::WebSocketStream;
use dish_dashboard::api::DishSource;
use dish_dashboard::dashboard::{Change, Dashboard};
use dish_dashboard::data::Dish;
use dish_dashboard::live::{LiveUpdates, Signal, SocketIoChannel};
use futures::{AsyncRead, AsyncWrite, StreamExt};
use tokio::net::TcpListener;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use url::Url;

const HANDSHAKE: &str = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
const WAIT: Duration = Duration::from_secs(5);

async fn next_text<S>(ws: &mut WebSocketStream<S>) -> Option<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Text(text)) => return Some(text.as_str().to_string()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
    None
}

async fn send<S>(ws: &mut WebSocketStream<S>, text: &str)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    ws.send(Message::text(text.to_string())).await.unwrap();
}

/// A one-connection Socket.IO server: runs the handshake, then plays
/// `script` and finally returns every packet the client sent afterwards.
async fn serve(script: Vec<&'static str>) -> (Url, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = async_tungstenite::tokio::accept_async(stream).await.unwrap();

        send(&mut ws, HANDSHAKE).await;
        assert_eq!(next_text(&mut ws).await.as_deref(), Some("40"));

        for packet in script {
            send(&mut ws, packet).await;
            if packet == "2" {
                assert_eq!(next_text(&mut ws).await.as_deref(), Some("3"));
            }
        }

        let mut tail = Vec::new();
        while let Some(text) = next_text(&mut ws).await {
            tail.push(text);
        }
        tail
    });

    (Url::parse(&format!("http://{addr}")).unwrap(), server)
}

#[tokio::test]
async fn test_socketio_session() {
    let (base, server) = serve(vec![r#"40{"sid":"wZX3oN0bSVIhsaknAAAI"}"#, "2", r#"42["dishUpdated"]"#]).await;

    let channel = SocketIoChannel::new(&base).unwrap();
    let (tx, mut rx) = unbounded_channel();
    let mut subscription = channel.subscribe(tx);

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(Signal::Connected));
    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(Signal::DishUpdated));

    subscription.disconnect();
    let tail = timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(tail, vec!["41".to_string()]);
    // the session is over, so is the signal stream
    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_refused_namespace_ends_the_channel() {
    let (base, _server) = serve(vec![r#"44{"message":"Not authorized"}"#]).await;

    let channel = SocketIoChannel::new(&base).unwrap();
    let (tx, mut rx) = unbounded_channel();
    let _subscription = channel.subscribe(tx);

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_disconnect_during_handshake_ends_the_channel() {
    // accepts the tcp connection but never answers the websocket upgrade
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (accepted_tx, accepted_rx) = oneshot::channel();
    let _server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        accepted_tx.send(()).unwrap();
        let mut buf = [0u8; 1024];
        while matches!(stream.read(&mut buf).await, Ok(n) if n > 0) {}
    });

    let base = Url::parse(&format!("http://{addr}")).unwrap();
    let channel = SocketIoChannel::new(&base).unwrap();
    assert_eq!(channel.url().path(), "/socket.io/");
    let (tx, mut rx) = unbounded_channel();
    let mut subscription = channel.subscribe(tx);

    timeout(WAIT, accepted_rx).await.unwrap().unwrap();
    subscription.disconnect();
    assert!(!subscription.is_open());
    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_unreachable_server_ends_the_channel() {
    let base = Url::parse("http://127.0.0.1:9").unwrap();
    let channel = SocketIoChannel::new(&base).unwrap();
    let (tx, mut rx) = unbounded_channel();
    let _subscription = channel.subscribe(tx);

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), None);
}

/// Every fetch returns one dish whose name counts the fetches so far.
#[derive(Default)]
struct CountingSource {
    calls: AtomicUsize,
}

#[async_trait]
impl DishSource for CountingSource {
    async fn list_dishes(&self) -> anyhow::Result<Vec<Dish>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(vec![Dish {
            id: "1".to_string(),
            dish_name: format!("Soup #{n}"),
            image_url: "u1".to_string(),
            is_published: true,
        }])
    }

    async fn toggle_dish(&self, _id: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_dashboard_refetches_on_server_push() {
    let (base, server) = serve(vec![r#"40{"sid":"n1"}"#, r#"42["dishUpdated",{"_id":"1"}]"#]).await;

    let source = Arc::new(CountingSource::default());
    let channel = SocketIoChannel::new(&base).unwrap();
    let mut dashboard = Dashboard::mount(source.clone(), &channel);

    let mut changes = Vec::new();
    let mut loaded_once = false;
    while changes.iter().filter(|c| **c == Change::Loaded).count() < 2 {
        let change = timeout(WAIT, dashboard.next_change()).await.unwrap();
        if loaded_once {
            assert!(!dashboard.is_loading(), "loading again after {change:?}");
        }
        loaded_once |= change == Change::Loaded;
        changes.push(change);
    }

    assert_eq!(changes.iter().filter(|c| **c == Change::Connected).count(), 1);
    assert_eq!(changes.iter().filter(|c| **c == Change::Refetching).count(), 1);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert_eq!(dashboard.dishes()[0].dish_name, "Soup #2");

    dashboard.unmount();
    let tail = timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(tail, vec!["41".to_string()]);
}

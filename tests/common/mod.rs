#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pair_relay_service::{
    build_router,
    config::Config,
    models::{NewParticipant, Participant},
    services::{
        Identity, InMemoryDirectory, InMemoryMessageStore, MessageStore, ParticipantDirectory,
        StaticIdentityResolver,
    },
    AppState,
};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    tungstenite::{client::IntoClientRequest, Error as WsError, Message},
    MaybeTlsStream, WebSocketStream,
};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const ALICE_TOKEN: &str = "token1";
pub const BOB_TOKEN: &str = "token2";

const WAIT: Duration = Duration::from_secs(3);

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub store: Arc<InMemoryMessageStore>,
    pub alice: Participant,
    pub bob: Participant,
    server: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Directory with alice and bob, and a static token for each.
pub async fn seeded_state(
    config: Config,
    messages: Arc<dyn MessageStore>,
) -> (AppState, Participant, Participant) {
    let directory = Arc::new(InMemoryDirectory::new());
    let alice = directory
        .create(NewParticipant {
            username: "alice".into(),
            email: "alice@example.com".into(),
        })
        .await
        .unwrap();
    let bob = directory
        .create(NewParticipant {
            username: "bob".into(),
            email: "bob@example.com".into(),
        })
        .await
        .unwrap();

    let identity = StaticIdentityResolver::new()
        .with_token(
            ALICE_TOKEN,
            Identity {
                email: alice.email.clone(),
                username: alice.handle.clone(),
            },
        )
        .with_token(
            BOB_TOKEN,
            Identity {
                email: bob.email.clone(),
                username: bob.handle.clone(),
            },
        );

    let state = AppState::new(Arc::new(config), Arc::new(identity), directory, messages);
    (state, alice, bob)
}

pub async fn spawn_server() -> TestServer {
    spawn_server_with(Config::test_defaults()).await
}

pub async fn spawn_server_with(config: Config) -> TestServer {
    let store = Arc::new(InMemoryMessageStore::new());
    let (state, alice, bob) = seeded_state(config, store.clone()).await;
    let (addr, server) = serve(state.clone()).await;
    TestServer {
        addr,
        state,
        store,
        alice,
        bob,
        server,
    }
}

/// Starts the real router on an ephemeral port.
pub async fn serve(state: AppState) -> (SocketAddr, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, server)
}

pub async fn connect(addr: SocketAddr, token: &str, handle: &str) -> Result<Client, WsError> {
    let mut request = format!("ws://{addr}/api/v0/chat/{handle}")
        .into_client_request()
        .unwrap();
    request
        .headers_mut()
        .insert("Authorization", format!("Bearer {token}").parse().unwrap());
    let (client, _) = tokio_tungstenite::connect_async(request).await?;
    Ok(client)
}

/// Status of a rejected handshake.
pub async fn rejected_status(addr: SocketAddr, token: Option<&str>, handle: &str) -> u16 {
    let mut request = format!("ws://{addr}/api/v0/chat/{handle}")
        .into_client_request()
        .unwrap();
    if let Some(token) = token {
        request
            .headers_mut()
            .insert("Authorization", format!("Bearer {token}").parse().unwrap());
    }
    match tokio_tungstenite::connect_async(request).await {
        Err(WsError::Http(response)) => response.status().as_u16(),
        Err(other) => panic!("unexpected handshake error: {other}"),
        Ok(_) => panic!("handshake should have been rejected"),
    }
}

pub async fn send_body(client: &mut Client, body: &str) {
    let frame = serde_json::to_string(body).unwrap();
    client.send(Message::Text(frame)).await.unwrap();
}

/// Next relayed body, skipping control frames.
pub async fn recv_body(client: &mut Client) -> String {
    tokio::time::timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str::<String>(&text).unwrap()
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                other => panic!("expected a text frame, got {other:?}"),
            }
        }
    })
    .await
    .expect("timed out waiting for a relayed message")
}

/// True if the server closes the connection within the wait window.
pub async fn closed_by_server(client: &mut Client) -> bool {
    tokio::time::timeout(WAIT, async {
        loop {
            match client.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return true,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .unwrap_or(false)
}

/// Nothing arrives for `window`.
pub async fn stays_silent(client: &mut Client, window: Duration) -> bool {
    tokio::time::timeout(window, client.next()).await.is_err()
}

pub async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within {WAIT:?}");
}

/// Waits until both registry maps hold `expected` entries, so a message sent
/// afterwards finds the counterpart's conduit.
pub async fn wait_for_sessions(state: &AppState, expected: usize) {
    wait_until(|| async {
        state.registry.session_count().await == expected
            && state.registry.conduit_count().await == expected
    })
    .await;
}

pub async fn wait_for_messages(store: &InMemoryMessageStore, expected: usize) {
    wait_until(|| async { store.messages().await.len() == expected }).await;
}

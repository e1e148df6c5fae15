use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::frame::{self, Inbound};
use super::registry::{Conduit, PushError, SessionId, SessionRegistry};
use super::PairKey;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{Message, Participant, ParticipantId};
use crate::services::MessageStore;

/// Write half of an upgraded socket. Only the owning session's forward loop
/// sends through it.
pub type SocketHandle = Arc<Mutex<SplitSink<WebSocket, WsMessage>>>;

pub type RelayRegistry = SessionRegistry<SocketHandle>;

enum ReadEnd {
    /// Peer closed, or reading or persisting a frame failed.
    Peer(AppResult<()>),
    /// Conduit replaced or socket write failed.
    ForwardDone,
}

/// Control loop for one upgraded connection.
///
/// The caller has already authenticated and resolved both participants;
/// `run` covers registration, relaying and teardown.
pub struct RelaySession {
    id: SessionId,
    sender: Participant,
    receiver: Participant,
    registry: RelayRegistry,
    store: Arc<dyn MessageStore>,
    idle_timeout: Option<Duration>,
}

impl RelaySession {
    pub fn new(
        sender: Participant,
        receiver: Participant,
        registry: RelayRegistry,
        store: Arc<dyn MessageStore>,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            sender,
            receiver,
            registry,
            store,
            idle_timeout,
        }
    }

    fn sender_id(&self) -> ParticipantId {
        self.sender.participant_id()
    }

    fn receiver_id(&self) -> ParticipantId {
        self.receiver.participant_id()
    }

    pub async fn run(self, socket: WebSocket) {
        let (sink, mut stream) = socket.split();

        // Socket entry: where messages for this client go. Conduit: where the
        // counterpart's session drops them.
        let outbound = PairKey::new(self.sender_id(), self.receiver_id());
        let inbound = outbound.reversed();

        let socket: SocketHandle = Arc::new(Mutex::new(sink));
        self.registry
            .register(outbound, self.id, Arc::clone(&socket))
            .await;
        let conduit = self.registry.register_conduit(inbound, self.id).await;

        metrics::RELAY_SESSIONS_ACTIVE.inc();
        info!(
            session_id = %self.id,
            sender = %self.sender.handle,
            receiver = %self.receiver.handle,
            "relay session started"
        );

        let mut forward = tokio::spawn(forward_loop(
            self.id,
            conduit,
            self.registry.clone(),
            outbound,
        ));

        let (outcome, forward_done) = match self.read_loop(&mut stream, &mut forward).await {
            ReadEnd::Peer(outcome) => (outcome, false),
            ReadEnd::ForwardDone => (Ok(()), true),
        };

        self.teardown(&outbound, &inbound).await;

        if !forward_done {
            if let Err(e) = forward.await {
                warn!(session_id = %self.id, error = %e, "forward task failed");
            }
        }

        if let Err(e) = socket.lock().await.close().await {
            debug!(session_id = %self.id, error = %e, "socket already closed");
        }

        metrics::RELAY_SESSIONS_ACTIVE.dec();
        match outcome {
            Ok(()) => info!(
                session_id = %self.id,
                sender = %self.sender.handle,
                receiver = %self.receiver.handle,
                "relay session terminated"
            ),
            Err(e) => warn!(
                session_id = %self.id,
                sender = %self.sender.handle,
                receiver = %self.receiver.handle,
                error = %e,
                "relay session aborted"
            ),
        }
    }

    /// Reads frames until the peer leaves, a frame fails, or the forward task
    /// ends. The forward task is only raced while waiting for the next frame,
    /// so a frame that has been read is always persisted before the loop
    /// stops.
    async fn read_loop(
        &self,
        stream: &mut SplitStream<WebSocket>,
        forward: &mut JoinHandle<()>,
    ) -> ReadEnd {
        loop {
            let next = tokio::select! {
                biased;
                joined = &mut *forward => {
                    if let Err(e) = joined {
                        warn!(session_id = %self.id, error = %e, "forward task failed");
                    }
                    return ReadEnd::ForwardDone;
                }
                next = self.next_frame(stream) => next,
            };

            let frame = match next {
                Ok(Some(frame)) => frame,
                Ok(None) => return ReadEnd::Peer(Ok(())),
                Err(e) => return ReadEnd::Peer(Err(e)),
            };

            let step = match frame::decode(frame) {
                Ok(Inbound::Body(body)) => self.relay(body).await,
                Ok(Inbound::Control) => Ok(()),
                Ok(Inbound::Close) => return ReadEnd::Peer(Ok(())),
                Err(e) => Err(e),
            };
            if let Err(e) = step {
                return ReadEnd::Peer(Err(e));
            }
        }
    }

    async fn next_frame(
        &self,
        stream: &mut SplitStream<WebSocket>,
    ) -> AppResult<Option<WsMessage>> {
        let next = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, stream.next())
                .await
                .map_err(|_| AppError::Transport("idle timeout".into()))?,
            None => stream.next().await,
        };
        next.transpose().map_err(AppError::from)
    }

    /// Persist first, then offer the body to the counterpart's conduit.
    async fn relay(&self, body: String) -> AppResult<()> {
        let message = Message::new(self.sender_id(), self.receiver_id(), body);

        if let Err(e) = self.store.create(&message).await {
            error!(
                session_id = %self.id,
                sender = %self.sender.handle,
                receiver = %self.receiver.handle,
                error = %e,
                "failed to persist message"
            );
            return Err(e);
        }
        metrics::MESSAGES_PERSISTED.inc();

        let key = PairKey::new(self.sender_id(), self.receiver_id());
        let Some(conduit) = self.registry.lookup_conduit(&key).await else {
            debug!(session_id = %self.id, %key, "counterpart offline, persisted only");
            return Ok(());
        };

        match conduit.push(message.body) {
            Ok(()) => metrics::MESSAGES_FORWARDED.inc(),
            Err(reason) => {
                metrics::FORWARD_DROPPED
                    .with_label_values(&[reason.as_str()])
                    .inc();
                match reason {
                    PushError::Full => warn!(
                        session_id = %self.id,
                        %key,
                        "counterpart conduit full, live delivery skipped"
                    ),
                    PushError::Closed => {
                        debug!(session_id = %self.id, %key, "counterpart left mid-send")
                    }
                }
            }
        }
        Ok(())
    }

    async fn teardown(&self, outbound: &PairKey, inbound: &PairKey) {
        let removed = self.registry.release(self.id, outbound, inbound).await;
        debug!(session_id = %self.id, removed, "registry entries released");
    }
}

/// Drain this session's conduit into its socket.
///
/// Ends when the conduit closes, when the registry no longer maps `outbound`
/// to this session, or when a write fails.
async fn forward_loop(
    session: SessionId,
    mut conduit: Conduit,
    registry: RelayRegistry,
    outbound: PairKey,
) {
    while let Some(body) = conduit.recv().await {
        let Some(socket) = registry.lookup_for(&outbound, session).await else {
            break;
        };

        let frame = match frame::encode(&body) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(session_id = %session, error = %e, "dropping unencodable body");
                continue;
            }
        };

        let mut sink = socket.lock().await;
        if let Err(e) = sink.send(frame).await {
            debug!(session_id = %session, error = %e, "socket write failed");
            break;
        }
    }

    debug!(session_id = %session, conduit = %conduit.key(), "forward loop finished");
}

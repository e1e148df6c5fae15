use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{self, error::TrySendError, Receiver, Sender, WeakSender},
    Mutex,
};
use uuid::Uuid;

use super::PairKey;

/// Unique identifier for one relay session.
///
/// Registry entries remember which session wrote them so a session that was
/// replaced cannot tear down its successor's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Receiving end of a conduit, owned by the session that created it.
///
/// `recv` returns `None` once the registry drops the sending side, which is
/// how teardown unblocks the forward loop.
pub struct Conduit {
    key: PairKey,
    rx: Receiver<String>,
}

impl Conduit {
    pub fn key(&self) -> PairKey {
        self.key
    }

    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// Non-owning write handle to another session's conduit.
#[derive(Clone)]
pub struct ConduitHandle {
    tx: WeakSender<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// Conduit was deregistered after the lookup.
    Closed,
    /// Reader is behind by a full buffer.
    Full,
}

impl PushError {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushError::Closed => "closed",
            PushError::Full => "full",
        }
    }
}

impl ConduitHandle {
    /// Never waits: a full or vanished conduit is reported, not awaited.
    pub fn push(&self, body: String) -> Result<(), PushError> {
        let tx = self.tx.upgrade().ok_or(PushError::Closed)?;
        tx.try_send(body).map_err(|e| match e {
            TrySendError::Full(_) => PushError::Full,
            TrySendError::Closed(_) => PushError::Closed,
        })
    }
}

struct SocketEntry<S> {
    session: SessionId,
    socket: S,
}

struct ConduitEntry {
    session: SessionId,
    tx: Sender<String>,
}

struct Inner<S> {
    sockets: HashMap<PairKey, SocketEntry<S>>,
    conduits: HashMap<PairKey, ConduitEntry>,
}

/// Live sessions keyed by directed pair.
///
/// One lock guards both maps and is only ever held for map access, so every
/// operation is atomic with respect to every other and none waits on I/O.
pub struct SessionRegistry<S> {
    inner: Arc<Mutex<Inner<S>>>,
    conduit_capacity: usize,
}

impl<S> Clone for SessionRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            conduit_capacity: self.conduit_capacity,
        }
    }
}

impl<S: Clone> SessionRegistry<S> {
    pub fn new(conduit_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                sockets: HashMap::new(),
                conduits: HashMap::new(),
            })),
            conduit_capacity: conduit_capacity.max(1),
        }
    }

    /// Insert or overwrite the socket entry for `key`. Last writer wins.
    pub async fn register(&self, key: PairKey, session: SessionId, socket: S) {
        let mut guard = self.inner.lock().await;
        if let Some(prev) = guard
            .sockets
            .insert(key, SocketEntry { session, socket })
        {
            tracing::debug!(
                %key,
                replaced_session = %prev.session,
                %session,
                "socket entry replaced"
            );
        }
    }

    /// Create a conduit for `key` and hand its receiving end to the caller.
    ///
    /// A conduit already registered under `key` is dropped, which closes it
    /// for its previous owner.
    pub async fn register_conduit(&self, key: PairKey, session: SessionId) -> Conduit {
        let (tx, rx) = mpsc::channel(self.conduit_capacity);
        let mut guard = self.inner.lock().await;
        if let Some(prev) = guard.conduits.insert(key, ConduitEntry { session, tx }) {
            tracing::debug!(
                %key,
                replaced_session = %prev.session,
                %session,
                "conduit replaced"
            );
        }
        Conduit { key, rx }
    }

    pub async fn lookup(&self, key: &PairKey) -> Option<S> {
        let guard = self.inner.lock().await;
        guard.sockets.get(key).map(|entry| entry.socket.clone())
    }

    /// Like `lookup`, but only while the entry still belongs to `session`.
    pub async fn lookup_for(&self, key: &PairKey, session: SessionId) -> Option<S> {
        let guard = self.inner.lock().await;
        guard
            .sockets
            .get(key)
            .filter(|entry| entry.session == session)
            .map(|entry| entry.socket.clone())
    }

    pub async fn lookup_conduit(&self, key: &PairKey) -> Option<ConduitHandle> {
        let guard = self.inner.lock().await;
        guard.conduits.get(key).map(|entry| ConduitHandle {
            tx: entry.tx.downgrade(),
        })
    }

    /// Remove whatever socket entry and conduit are stored under `key`.
    /// Calling it for an absent key is a no-op.
    pub async fn deregister(&self, key: &PairKey) {
        let mut guard = self.inner.lock().await;
        guard.sockets.remove(key);
        guard.conduits.remove(key);
    }

    /// Session teardown: drop `session`'s socket entry under `outbound` and
    /// its conduit under `inbound` in one critical section.
    ///
    /// Entries that now belong to a newer session are left alone. Returns the
    /// number of entries removed, so a repeated call returns 0.
    pub async fn release(&self, session: SessionId, outbound: &PairKey, inbound: &PairKey) -> usize {
        let mut guard = self.inner.lock().await;
        let mut removed = 0;

        if guard
            .sockets
            .get(outbound)
            .is_some_and(|entry| entry.session == session)
        {
            guard.sockets.remove(outbound);
            removed += 1;
        }
        if guard
            .conduits
            .get(inbound)
            .is_some_and(|entry| entry.session == session)
        {
            guard.conduits.remove(inbound);
            removed += 1;
        }

        removed
    }

    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.sockets.len()
    }

    pub async fn conduit_count(&self) -> usize {
        self.inner.lock().await.conduits.len()
    }

    pub async fn contains_session(&self, key: &PairKey) -> bool {
        self.inner.lock().await.sockets.contains_key(key)
    }

    pub async fn contains_conduit(&self, key: &PairKey) -> bool {
        self.inner.lock().await.conduits.contains_key(key)
    }
}

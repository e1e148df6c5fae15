//! Pairwise relay: the session registry and the per-connection control loop.

pub mod frame;
pub mod pair_key;
pub mod registry;
pub mod session;

pub use pair_key::PairKey;
pub use registry::{Conduit, ConduitHandle, PushError, SessionId, SessionRegistry};
pub use session::{RelayRegistry, RelaySession, SocketHandle};

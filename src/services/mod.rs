//! Collaborators the relay depends on. Each trait has a PostgreSQL or JWT
//! implementation for production and an in-memory one for tests and local runs.

pub mod directory;
pub mod identity;
pub mod memory;
pub mod message_store;

pub use directory::{ParticipantDirectory, PgParticipantDirectory};
pub use identity::{Identity, IdentityResolver, JwtIdentityResolver, StaticIdentityResolver};
pub use memory::{InMemoryDirectory, InMemoryMessageStore};
pub use message_store::{MessageStore, PgMessageStore};

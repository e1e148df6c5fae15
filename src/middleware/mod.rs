pub mod auth;

pub use auth::{bearer_token, resolve_caller, resolve_pair, ResolvedPair};

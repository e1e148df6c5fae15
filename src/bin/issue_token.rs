//! Mint a bearer token for a participant, for local runs against the relay.
//! Run with: cargo run --bin issue_token
//!
//! Signs with the same `JWT__SECRET` / `JWT__ISSUER` the service loads.

use chrono::Duration;
use pair_relay_service::{
    config::Config,
    services::{Identity, JwtIdentityResolver},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    let email = std::env::var("TOKEN_EMAIL").unwrap_or_else(|_| "alice@example.com".to_string());
    let username = std::env::var("TOKEN_USERNAME").unwrap_or_else(|_| "alice".to_string());
    let ttl_hours: i64 = match std::env::var("TOKEN_TTL_HOURS") {
        Ok(raw) => raw.parse()?,
        Err(_) => 24,
    };

    let resolver = JwtIdentityResolver::new(&config.jwt);
    let token = resolver
        .issue_token(&Identity { email: email.clone(), username }, Duration::hours(ttl_hours))
        .map_err(|e| anyhow::anyhow!("token signing failed: {e}"))?;

    eprintln!("Token for {email} (valid {ttl_hours}h):");
    println!("{token}");
    Ok(())
}

//! Wire framing: every relayed unit is one text frame holding the
//! JSON-encoded message body, e.g. `"hi"`.

use axum::extract::ws::Message;

use crate::error::{AppError, AppResult};

#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    Body(String),
    /// Ping/pong; the transport answers these itself.
    Control,
    Close,
}

pub fn decode(frame: Message) -> AppResult<Inbound> {
    match frame {
        Message::Text(text) => parse_body(&text).map(Inbound::Body),
        Message::Binary(bytes) => {
            let text = std::str::from_utf8(&bytes)
                .map_err(|e| AppError::Transport(format!("binary frame is not utf-8: {e}")))?;
            parse_body(text).map(Inbound::Body)
        }
        Message::Ping(_) | Message::Pong(_) => Ok(Inbound::Control),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

pub fn encode(body: &str) -> AppResult<Message> {
    serde_json::to_string(body)
        .map(Message::Text)
        .map_err(|e| AppError::Transport(format!("encode frame: {e}")))
}

fn parse_body(text: &str) -> AppResult<String> {
    serde_json::from_str::<String>(text)
        .map_err(|e| AppError::Transport(format!("malformed frame: {e}")))
}

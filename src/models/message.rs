use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::ParticipantId;

/// One relayed message. Created once per inbound frame and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: ParticipantId, receiver: ParticipantId, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id: sender.as_uuid(),
            receiver_id: receiver.as_uuid(),
            body,
            created_at: Utc::now(),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Stable participant identifier. Handles can change; this never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ParticipantId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Participant {
    pub id: Uuid,
    #[serde(rename = "username")]
    #[sqlx(rename = "username")]
    pub handle: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn participant_id(&self) -> ParticipantId {
        ParticipantId(self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewParticipant {
    pub username: String,
    pub email: String,
}

impl NewParticipant {
    pub fn validate(&self) -> AppResult<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::BadRequest("username can't be empty".into()));
        }
        if self.email.trim().is_empty() {
            return Err(AppError::BadRequest("email can't be empty".into()));
        }
        Ok(())
    }

    pub fn into_participant(self) -> Participant {
        let now = Utc::now();
        Participant {
            id: Uuid::new_v4(),
            handle: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

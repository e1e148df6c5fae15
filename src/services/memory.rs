use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MessageStore, ParticipantDirectory};
use crate::error::{AppError, AppResult};
use crate::models::{Message, NewParticipant, Participant, ParticipantId};

#[derive(Default)]
pub struct InMemoryDirectory {
    participants: RwLock<Vec<Participant>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipantDirectory for InMemoryDirectory {
    async fn get_by_email(&self, email: &str) -> AppResult<Participant> {
        let guard = self.participants.read().await;
        guard
            .iter()
            .find(|p| p.email == email)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("participant with email {email}")))
    }

    async fn get_by_handle(&self, handle: &str) -> AppResult<Participant> {
        let guard = self.participants.read().await;
        guard
            .iter()
            .find(|p| p.handle == handle)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("participant {handle}")))
    }

    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Participant>> {
        let guard = self.participants.read().await;
        let needle = search.map(str::to_lowercase);
        let mut found: Vec<Participant> = guard
            .iter()
            .filter(|p| match &needle {
                Some(n) => p.handle.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.handle.cmp(&b.handle));
        Ok(found)
    }

    async fn create(&self, new: NewParticipant) -> AppResult<Participant> {
        new.validate()?;
        let participant = new.into_participant();

        let mut guard = self.participants.write().await;
        if guard
            .iter()
            .any(|p| p.handle == participant.handle || p.email == participant.email)
        {
            return Err(AppError::Conflict(format!(
                "participant {} already exists",
                participant.handle
            )));
        }
        guard.push(participant.clone());
        Ok(participant)
    }
}

#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored message in insertion order.
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn create(&self, message: &Message) -> AppResult<()> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn history(
        &self,
        a: ParticipantId,
        b: ParticipantId,
        limit: i64,
    ) -> AppResult<Vec<Message>> {
        let (a, b) = (a.as_uuid(), b.as_uuid());
        let guard = self.messages.read().await;
        let between: Vec<&Message> = guard
            .iter()
            .filter(|m| {
                (m.sender_id == a && m.receiver_id == b) || (m.sender_id == b && m.receiver_id == a)
            })
            .collect();

        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let skip = between.len().saturating_sub(limit);
        Ok(between.into_iter().skip(skip).cloned().collect())
    }
}

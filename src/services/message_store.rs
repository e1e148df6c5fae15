use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{Message, ParticipantId};

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Durably append one message.
    async fn create(&self, message: &Message) -> AppResult<()>;

    /// Most recent `limit` messages exchanged between `a` and `b` in either
    /// direction, oldest first.
    async fn history(
        &self,
        a: ParticipantId,
        b: ParticipantId,
        limit: i64,
    ) -> AppResult<Vec<Message>>;
}

// `seq` breaks ties between rows written within the same timestamp.
const HISTORY_SQL: &str = r#"
    SELECT id, sender_id, receiver_id, body, created_at
    FROM messages
    WHERE (sender_id = $1 AND receiver_id = $2)
       OR (sender_id = $2 AND receiver_id = $1)
    ORDER BY created_at DESC, seq DESC
    LIMIT $3
"#;

#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn create(&self, message: &Message) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id)
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.body)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn history(
        &self,
        a: ParticipantId,
        b: ParticipantId,
        limit: i64,
    ) -> AppResult<Vec<Message>> {
        let mut rows = sqlx::query_as::<_, Message>(HISTORY_SQL)
            .bind(a.as_uuid())
            .bind(b.as_uuid())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.reverse();
        Ok(rows)
    }
}

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::{NewParticipant, Participant};

#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    async fn get_by_email(&self, email: &str) -> AppResult<Participant>;

    async fn get_by_handle(&self, handle: &str) -> AppResult<Participant>;

    /// All participants, or those whose handle contains `search` (case-insensitive).
    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Participant>>;

    async fn create(&self, new: NewParticipant) -> AppResult<Participant>;
}

#[derive(Clone)]
pub struct PgParticipantDirectory {
    pool: PgPool,
}

impl PgParticipantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantDirectory for PgParticipantDirectory {
    async fn get_by_email(&self, email: &str) -> AppResult<Participant> {
        sqlx::query_as::<_, Participant>(
            "SELECT id, username, email, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("participant with email {email}")))
    }

    async fn get_by_handle(&self, handle: &str) -> AppResult<Participant> {
        sqlx::query_as::<_, Participant>(
            "SELECT id, username, email, created_at, updated_at FROM users WHERE username = $1",
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("participant {handle}")))
    }

    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Participant>> {
        let rows = match search {
            Some(term) => {
                sqlx::query_as::<_, Participant>(
                    r#"
                    SELECT id, username, email, created_at, updated_at
                    FROM users
                    WHERE username ILIKE '%' || $1 || '%' ESCAPE '\'
                    ORDER BY username
                    "#,
                )
                .bind(escape_like(term))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Participant>(
                    "SELECT id, username, email, created_at, updated_at FROM users ORDER BY username",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn create(&self, new: NewParticipant) -> AppResult<Participant> {
        new.validate()?;
        let participant = new.into_participant();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(participant.id)
        .bind(&participant.handle)
        .bind(&participant.email)
        .bind(participant.created_at)
        .bind(participant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(participant)
    }
}

/// Escape `ILIKE` wildcards so a search term only matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

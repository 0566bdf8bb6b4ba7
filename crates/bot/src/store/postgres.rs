//! `PostgreSQL`-backed conversation state.

use sqlx::PgPool;
use storebot_core::{ConversationState, UserId};
use tracing::instrument;

use super::{StateStore, StoreError};

/// Conversation state stored in `storebot.conversation_state`.
///
/// Survives restarts, so users coming back to an old keyboard resume where
/// they left off.
#[derive(Debug, Clone)]
pub struct PgStateStore {
    pool: PgPool,
}

impl PgStateStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl StateStore for PgStateStore {
    #[instrument(skip(self), fields(user = %user))]
    async fn get(&self, user: UserId) -> Result<Option<String>, StoreError> {
        let tag = sqlx::query_scalar::<_, String>(
            r"
            SELECT state
            FROM storebot.conversation_state
            WHERE user_id = $1
            ",
        )
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    #[instrument(skip(self), fields(user = %user, state = %state))]
    async fn set(&self, user: UserId, state: ConversationState) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO storebot.conversation_state (user_id, state)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET state = EXCLUDED.state, updated_at = now()
            ",
        )
        .bind(user)
        .bind(state.as_tag())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

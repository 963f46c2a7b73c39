//! PostgreSQL implementation of MessageStore.
//!
//! Persists chat messages to the `chat_messages` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::{MessageId, RoomId, Timestamp};
use crate::ports::{MessageStore, MessageStoreError};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS chat_messages (
        seq         BIGSERIAL PRIMARY KEY,
        id          UUID NOT NULL UNIQUE,
        room_id     TEXT NOT NULL,
        username    TEXT NOT NULL,
        content     TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL
    )
"#;

const CREATE_ROOM_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS chat_messages_room_seq ON chat_messages (room_id, seq)";

/// PostgreSQL implementation of MessageStore.
#[derive(Clone)]
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    /// Creates a new PostgresMessageStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the messages table and its index if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), MessageStoreError> {
        for statement in [CREATE_TABLE, CREATE_ROOM_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    MessageStoreError::Database(format!("Failed to create schema: {}", e))
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn save_message(&self, message: &ChatMessage) -> Result<(), MessageStoreError> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, room_id, username, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.room_id.as_str())
        .bind(&message.username)
        .bind(&message.content)
        .bind(message.timestamp.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| MessageStoreError::Database(format!("Failed to insert message: {}", e)))?;

        Ok(())
    }

    async fn messages_for_room(&self, room: &RoomId) -> Result<Vec<ChatMessage>, MessageStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, room_id, username, content, created_at
            FROM chat_messages
            WHERE room_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(room.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MessageStoreError::Database(format!("Failed to fetch messages: {}", e)))?;

        rows.into_iter().map(row_to_message).collect()
    }
}

fn row_to_message(row: PgRow) -> Result<ChatMessage, MessageStoreError> {
    let column_error =
        |e: sqlx::Error| MessageStoreError::Database(format!("Invalid message row: {}", e));

    let id: Uuid = row.try_get("id").map_err(column_error)?;
    let room_id: String = row.try_get("room_id").map_err(column_error)?;
    let username: String = row.try_get("username").map_err(column_error)?;
    let content: String = row.try_get("content").map_err(column_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(column_error)?;

    let room_id = RoomId::new(room_id)
        .map_err(|e| MessageStoreError::Database(format!("Invalid room id in row: {}", e)))?;

    Ok(ChatMessage {
        id: MessageId::from_uuid(id),
        room_id,
        username,
        content,
        timestamp: Timestamp::from_datetime(created_at),
    })
}

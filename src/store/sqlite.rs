//! SQLite 持久化存储
//!
//! 单连接（Mutex 串行化）承载三张表：sessions（检查点）、orders（订单）、
//! action_tickets（工单台账）。幂等键是 action_tickets 的主键，
//! 重复插入由 SQLite 唯一约束拒绝并映射为 Conflict。

use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use crate::agent::state::ConversationState;
use crate::store::traits::{
    CheckpointStore, InsertOutcome, OrderRecord, OrderStore, StoreError, Ticket, TicketLedger,
};

/// SQLite 版三合一存储
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// 打开（或创建）数据库文件并建表
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 内存数据库（测试用）
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_tables(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                state      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS orders (
                order_number TEXT PRIMARY KEY,
                record       TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS action_tickets (
                idempotency_key TEXT PRIMARY KEY,
                ticket_id       TEXT NOT NULL,
                order_id        TEXT NOT NULL,
                action          TEXT NOT NULL,
                status          TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                customer_email  TEXT NOT NULL,
                refund_amount   REAL
            );",
        )?;
        Ok(())
    }

    /// 预置订单（seed 工具与测试用）
    pub async fn insert_order(&self, record: &OrderRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO orders (order_number, record) VALUES (?1, ?2)",
            params![record.order_number, json],
        )?;
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for SqliteStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>, StoreError> {
        let conn = self.conn.lock().await;
        let json: Option<String> = conn
            .query_row(
                "SELECT state FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO sessions (session_id, state, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id) DO UPDATE SET state = ?2, updated_at = ?3",
            params![session_id, json, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let conn = self.conn.lock().await;
        let json: Option<String> = conn
            .query_row(
                "SELECT record FROM orders WHERE order_number = ?1",
                params![order_number],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TicketLedger for SqliteStore {
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Ticket>, StoreError> {
        let conn = self.conn.lock().await;
        let ticket = conn
            .query_row(
                "SELECT ticket_id, idempotency_key, order_id, action, status, created_at,
                        customer_email, refund_amount
                 FROM action_tickets WHERE idempotency_key = ?1",
                params![key],
                |row| {
                    let created_at: String = row.get(5)?;
                    Ok(Ticket {
                        ticket_id: row.get(0)?,
                        idempotency_key: row.get(1)?,
                        order_id: row.get(2)?,
                        action: row.get(3)?,
                        status: row.get(4)?,
                        created_at: created_at
                            .parse()
                            .unwrap_or_else(|_| chrono::Utc::now()),
                        customer_email: row.get(6)?,
                        refund_amount: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(ticket)
    }

    async fn insert(&self, ticket: &Ticket) -> Result<InsertOutcome, StoreError> {
        let conn = self.conn.lock().await;
        let result = conn.execute(
            "INSERT INTO action_tickets
             (idempotency_key, ticket_id, order_id, action, status, created_at,
              customer_email, refund_amount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                ticket.idempotency_key,
                ticket.ticket_id,
                ticket.order_id,
                ticket.action,
                ticket.status,
                ticket.created_at.to_rfc3339(),
                ticket.customer_email,
                ticket.refund_amount,
            ],
        );
        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(InsertOutcome::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }
}

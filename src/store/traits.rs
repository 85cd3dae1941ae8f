//! 存储接口：检查点 / 订单 / 工单台账
//!
//! 三个窄接口对应三个外部协作者。订单库对本引擎只读；工单台账以幂等键唯一约束
//! 作为恰好一次副作用的正确性机制（由存储层保证，不做应用级加锁）。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::state::ConversationState;

/// 存储层错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// 外部订单库的原始记录（字段名跟随外部 schema，由 lookup Worker 归一化）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_number: String,
    pub first_name: String,
    pub last_name: String,
    pub user_email: String,
    pub user_contact_number: String,
    pub items: Vec<OrderRecordItem>,
    pub order_total: f64,
    pub order_date: DateTime<Utc>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub status: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// 外部订单条目
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderRecordItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
    #[serde(default)]
    pub category: Option<String>,
}

/// 台账中的工单记录
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub idempotency_key: String,
    pub order_id: String,
    pub action: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub customer_email: String,
    pub refund_amount: Option<f64>,
}

/// 插入结果：成功，或幂等键冲突（已有同键记录）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Conflict,
}

/// 检查点存储：按会话 ID 读写完整会话状态
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>, StoreError>;

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<(), StoreError>;
}

/// 订单库（只读）
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderRecord>, StoreError>;
}

/// 工单台账：幂等键唯一
#[async_trait]
pub trait TicketLedger: Send + Sync {
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Ticket>, StoreError>;

    async fn insert(&self, ticket: &Ticket) -> Result<InsertOutcome, StoreError>;
}

//! 内存存储（测试与离线开发用）
//!
//! 用 RwLock<HashMap> 实现三个存储接口；语义与 SQLite 版一致，
//! 包括幂等键冲突的判定。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::agent::state::ConversationState;
use crate::store::traits::{
    CheckpointStore, InsertOutcome, OrderRecord, OrderStore, StoreError, Ticket, TicketLedger,
};

/// 内存版三合一存储
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, ConversationState>>,
    orders: RwLock<HashMap<String, OrderRecord>>,
    tickets: RwLock<HashMap<String, Ticket>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置订单（测试 / 演示数据）
    pub async fn insert_order(&self, record: OrderRecord) {
        self.orders
            .write()
            .await
            .insert(record.order_number.clone(), record);
    }

    /// 台账中的记录条数
    pub async fn ticket_count(&self) -> usize {
        self.tickets.read().await.len()
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>, StoreError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), state.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self.orders.read().await.get(order_number).cloned())
    }
}

#[async_trait]
impl TicketLedger for MemoryStore {
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Ticket>, StoreError> {
        Ok(self.tickets.read().await.get(key).cloned())
    }

    async fn insert(&self, ticket: &Ticket) -> Result<InsertOutcome, StoreError> {
        let mut tickets = self.tickets.write().await;
        if tickets.contains_key(&ticket.idempotency_key) {
            return Ok(InsertOutcome::Conflict);
        }
        tickets.insert(ticket.idempotency_key.clone(), ticket.clone());
        Ok(InsertOutcome::Inserted)
    }
}

//! 工单创建 Worker（退货与退款共用，恰好一次副作用）
//!
//! 幂等键 = SHA-256("{order_id}|{action}")。先查台账：命中则返回既有工单
//! （status=duplicate，不再写入）；未命中则插入，唯一约束兜底并发竞争
//! （Conflict 时回读并按 duplicate 处理）。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::agent::state::{
    ActionTicket, ConversationState, DesiredAction, Patch, StateUpdate, TicketStatus,
};
use crate::agent::workers::Worker;
use crate::store::{InsertOutcome, Ticket, TicketLedger};

/// 幂等键：同一订单 + 同一动作 的重复请求落到同一键上
pub fn idempotency_key(order_id: &str, action: DesiredAction) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}", order_id, action.as_str()).as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct ProcessTicketWorker {
    ledger: Arc<dyn TicketLedger>,
    action: DesiredAction,
}

impl ProcessTicketWorker {
    /// 退货工单（RMA-）
    pub fn return_worker(ledger: Arc<dyn TicketLedger>) -> Self {
        Self {
            ledger,
            action: DesiredAction::Return,
        }
    }

    /// 退款工单（REF-）
    pub fn refund_worker(ledger: Arc<dyn TicketLedger>) -> Self {
        Self {
            ledger,
            action: DesiredAction::Refund,
        }
    }

    fn ticket_prefix(&self) -> &'static str {
        match self.action {
            DesiredAction::Refund => "REF",
            _ => "RMA",
        }
    }

    fn duplicate(existing: Ticket, key: String) -> StateUpdate {
        tracing::info!(ticket_id = %existing.ticket_id, "idempotent hit, reusing existing ticket");
        StateUpdate {
            action_ticket: Patch::Set(ActionTicket {
                id: Some(existing.ticket_id),
                status: TicketStatus::Duplicate,
            }),
            idempotency_key: Patch::Set(key),
            ..Default::default()
        }
    }

    fn write_failed(detail: String) -> StateUpdate {
        let mut update = StateUpdate::fail(
            "TICKET_WRITE_FAILED",
            detail,
            "I encountered an error while creating your ticket. Please try again.",
        );
        update.action_ticket = Patch::Set(ActionTicket {
            id: None,
            status: TicketStatus::Failed,
        });
        update
    }
}

#[async_trait]
impl Worker for ProcessTicketWorker {
    fn name(&self) -> &'static str {
        match self.action {
            DesiredAction::Refund => "process_refund",
            _ => "process_return",
        }
    }

    async fn run(&self, state: &ConversationState) -> StateUpdate {
        let order = match &state.order {
            Some(order) => order,
            None => {
                return StateUpdate::fail(
                    "NO_ORDER_DATA",
                    "no order data for ticket processing",
                    "I'm sorry, I lost your order details before creating the ticket. Could you share your order number again, please?",
                )
            }
        };

        // 本会话已有工单：重入为 no-op
        if let Some(ticket) = &state.action_ticket {
            if ticket.id.is_some() {
                return StateUpdate::default();
            }
        }

        let key = idempotency_key(&order.order_id, self.action);

        // 台账优先：重试 / 恢复路径不会二次写入
        match self.ledger.find_by_idempotency_key(&key).await {
            Ok(Some(existing)) => return Self::duplicate(existing, key),
            Ok(None) => {}
            Err(e) => return Self::write_failed(e.to_string()),
        }

        let ticket_id = format!(
            "{}-{}-{}",
            self.ticket_prefix(),
            Utc::now().format("%Y%m%d"),
            order.order_id
        );
        let ticket = Ticket {
            ticket_id: ticket_id.clone(),
            idempotency_key: key.clone(),
            order_id: order.order_id.clone(),
            action: self.action.as_str().to_string(),
            status: "created".to_string(),
            created_at: Utc::now(),
            customer_email: order.customer_email.clone(),
            refund_amount: match self.action {
                DesiredAction::Refund => Some(order.total_amount),
                _ => None,
            },
        };

        match self.ledger.insert(&ticket).await {
            Ok(InsertOutcome::Inserted) => {
                tracing::info!(%ticket_id, action = self.action.as_str(), "ticket created");
                StateUpdate {
                    action_ticket: Patch::Set(ActionTicket {
                        id: Some(ticket_id.clone()),
                        status: TicketStatus::Created,
                    }),
                    idempotency_key: Patch::Set(key),
                    ..Default::default()
                }
                .and_say(format!(
                    "Great! I've created {} ticket **{}** for your order.",
                    self.action.as_str(),
                    ticket_id
                ))
            }
            // 并发竞争：别的写入先落了同键记录，回读既有工单
            Ok(InsertOutcome::Conflict) => match self.ledger.find_by_idempotency_key(&key).await {
                Ok(Some(existing)) => Self::duplicate(existing, key),
                Ok(None) => Self::write_failed("conflict without existing ticket".to_string()),
                Err(e) => Self::write_failed(e.to_string()),
            },
            Err(e) => {
                tracing::error!(error = %e, "ticket insert failed");
                Self::write_failed(e.to_string())
            }
        }
    }
}

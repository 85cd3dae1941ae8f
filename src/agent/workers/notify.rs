//! 客户通知 Worker 与通知能力
//!
//! 需要订单与工单号齐备；Mock 实现仅打日志并返回成功，生产实现可替换为真实邮件服务。

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::state::{ConversationState, NotificationStatus, Patch, StateUpdate};
use crate::agent::workers::Worker;

/// 通知外发能力
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Mock 通知器：记录日志，始终成功
#[derive(Debug, Default)]
pub struct MockNotifier;

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        tracing::info!(%to, %subject, %body, "mock notification dispatched");
        Ok(())
    }
}

pub struct NotifyWorker {
    notifier: Arc<dyn Notifier>,
}

impl NotifyWorker {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Worker for NotifyWorker {
    fn name(&self) -> &'static str {
        "notify"
    }

    async fn run(&self, state: &ConversationState) -> StateUpdate {
        let ticket_id = state
            .action_ticket
            .as_ref()
            .and_then(|t| t.id.as_deref());

        // 数据不齐或发送失败都只标记 failed，收尾步会向用户附加说明；
        // 通知不是工作流的硬依赖，不因它暂停。
        let (order, ticket_id) = match (&state.order, ticket_id) {
            (Some(order), Some(id)) => (order, id),
            _ => {
                tracing::warn!("missing order or ticket data for notification");
                return StateUpdate {
                    notification_status: Patch::Set(NotificationStatus::Failed),
                    ..Default::default()
                };
            }
        };

        let action = state
            .desired_action
            .map(|a| a.as_str())
            .unwrap_or("request");
        let subject = format!("Your {} request #{}", action, ticket_id);
        let body = format!(
            "Your {} request has been created. Ticket ID: {}",
            action, ticket_id
        );

        match self
            .notifier
            .send(&order.customer_email, &subject, &body)
            .await
        {
            Ok(()) => StateUpdate {
                notification_status: Patch::Set(NotificationStatus::Sent),
                ..Default::default()
            },
            Err(e) => {
                tracing::error!(error = %e, "notification dispatch failed");
                StateUpdate {
                    notification_status: Patch::Set(NotificationStatus::Failed),
                    ..Default::default()
                }
            }
        }
    }
}

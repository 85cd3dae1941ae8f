//! 订单查询 Worker
//!
//! 按订单号查外部订单库，把外部 schema 归一化为内部投影。
//! 未命中与库故障都不抛错：置 error 并附道歉消息，等用户下一条消息。

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::state::{ConversationState, OrderItem, OrderSnapshot, Patch, StateUpdate};
use crate::agent::workers::Worker;
use crate::store::{OrderRecord, OrderStore};

pub struct LookupOrderWorker {
    orders: Arc<dyn OrderStore>,
}

impl LookupOrderWorker {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// 外部字段名 → 内部投影
    fn normalize(record: OrderRecord) -> OrderSnapshot {
        OrderSnapshot {
            order_id: record.order_number,
            customer_email: record.user_email,
            first_name: record.first_name,
            last_name: record.last_name,
            contact_number: record.user_contact_number,
            items: record
                .items
                .into_iter()
                .map(|item| OrderItem {
                    product_name: item.product_name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    category: item.category,
                })
                .collect(),
            order_date: record.order_date,
            delivery_date: record.delivery_date,
            total_amount: record.order_total,
            status: record.status,
            tracking_number: record.tracking_number,
        }
    }
}

#[async_trait]
impl Worker for LookupOrderWorker {
    fn name(&self) -> &'static str {
        "lookup_order"
    }

    async fn run(&self, state: &ConversationState) -> StateUpdate {
        let order_number = match &state.order_number {
            Some(n) => n.clone(),
            None => {
                return StateUpdate::fail(
                    "MISSING_ORDER_NUMBER",
                    "order number is required for lookup",
                    "I seem to have lost track of your order number. Could you share it again, please?",
                )
            }
        };

        tracing::info!(%order_number, "looking up order");
        match self.orders.find_by_order_number(&order_number).await {
            Ok(Some(record)) => {
                let snapshot = Self::normalize(record);
                tracing::info!(order_id = %snapshot.order_id, "order found");
                StateUpdate {
                    order: Patch::Set(snapshot),
                    order_match_confidence: Patch::Set(1.0),
                    // 新加载的订单尚未经用户确认；重查路径上清掉旧的确认结果
                    user_confirmed_order: Patch::Clear,
                    ..Default::default()
                }
            }
            Ok(None) => {
                tracing::warn!(%order_number, "order not found");
                let mut update = StateUpdate::fail(
                    "ORDER_NOT_FOUND",
                    format!("Order {} not found", order_number),
                    format!(
                        "I couldn't find order **{}** in our system. \
                         Please check the order number and try again.",
                        order_number
                    ),
                );
                // 号码没匹配上：清掉以便下一轮重新收集
                update.order_number = Patch::Clear;
                update
            }
            Err(e) => {
                tracing::error!(error = %e, "order store query failed");
                StateUpdate::fail(
                    "DATABASE_ERROR",
                    e.to_string(),
                    "I'm having trouble accessing the order database. Please try again in a moment.",
                )
            }
        }
    }
}

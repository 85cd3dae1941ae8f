//! 订单确认 Worker
//!
//! 第一次进入时输出订单摘要（邮箱遮蔽）请求确认；再次进入时解析用户的肯定 / 否定答复。
//! 否定答复会把 order_number / order 清回未设置，允许重新进入查询。

use async_trait::async_trait;

use crate::agent::state::{ConversationState, OrderSnapshot, Patch, Role, StateUpdate};
use crate::agent::workers::{contains_token, format_date, mask_email, Worker};

const AFFIRMATIVE: &[&str] = &["yes", "correct", "yep", "yeah", "right"];
const NEGATIVE: &[&str] = &["no", "wrong", "incorrect", "nope"];

/// 订单摘要（条目列表 + 遮蔽邮箱 + 确认问句）
fn format_order_summary(order: &OrderSnapshot) -> String {
    let order_date = format_date(order.order_date);
    let delivery_date = order
        .delivery_date
        .map(format_date)
        .unwrap_or_else(|| "Unknown".to_string());

    let items = if order.items.is_empty() {
        "  • No items".to_string()
    } else {
        order
            .items
            .iter()
            .map(|item| {
                format!(
                    "  • {} (x{}) - ${:.2}",
                    item.product_name, item.quantity, item.unit_price
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "I found your order:\n\n\
         Order #{}\n\
         • Order Date: {}\n\
         • Delivery Date: {}\n\
         • Total: ${:.2}\n\
         • Email: {}\n\n\
         Items:\n{}\n\n\
         Is this the correct order?",
        order.order_id,
        order_date,
        delivery_date,
        order.total_amount,
        mask_email(&order.customer_email),
        items
    )
}

pub struct ConfirmOrderWorker;

#[async_trait]
impl Worker for ConfirmOrderWorker {
    fn name(&self) -> &'static str {
        "confirm_order"
    }

    async fn run(&self, state: &ConversationState) -> StateUpdate {
        let order = match &state.order {
            Some(order) => order,
            None => {
                return StateUpdate::fail(
                    "NO_ORDER_DATA",
                    "no order data to confirm",
                    "I'm sorry, I don't have your order details on hand. Could you share your order number again, please?",
                )
            }
        };

        // 已有确认结果：不重复处理
        if state.user_confirmed_order.is_some() {
            return StateUpdate::default();
        }

        // 刚问过确认且用户还没回：不重复提问
        if let Some(m) = state.last_message() {
            if m.role == Role::Assistant {
                let text = m.text.to_lowercase();
                if text.contains("is this the correct order") || text.contains("please reply") {
                    return StateUpdate::default();
                }
            }
        }

        let last_user = state.last_user_text().unwrap_or_default().to_string();

        if AFFIRMATIVE.iter().any(|t| contains_token(&last_user, t)) {
            return StateUpdate {
                user_confirmed_order: Patch::Set(true),
                ..Default::default()
            }
            .and_say("Perfect! Let me check what options are available for your order...");
        }

        if NEGATIVE.iter().any(|t| contains_token(&last_user, t)) {
            // 否认：订单号与订单回到未设置，重新进入收集 / 查询
            return StateUpdate {
                user_confirmed_order: Patch::Set(false),
                order_number: Patch::Clear,
                order: Patch::Clear,
                ..Default::default()
            }
            .and_say(
                "I apologize for the confusion. Let's start over. What's your correct order number?",
            );
        }

        // 第一次进入：展示摘要并请求确认
        let summary = format_order_summary(order);
        StateUpdate::say(format!(
            "{}\n\nPlease reply 'yes' to confirm or 'no' if this isn't your order.",
            summary
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::state::{Message, OrderItem};
    use chrono::{Duration, Utc};

    fn order() -> OrderSnapshot {
        let now = Utc::now();
        OrderSnapshot {
            order_id: "ORD-2024-001".into(),
            customer_email: "john.smith@example.com".into(),
            first_name: "John".into(),
            last_name: "Smith".into(),
            contact_number: "+1-555-0101".into(),
            items: vec![OrderItem {
                product_name: "Wireless Headphones".into(),
                quantity: 1,
                unit_price: 79.99,
                category: Some("electronics".into()),
            }],
            order_date: now - Duration::days(6),
            delivery_date: Some(now - Duration::days(3)),
            total_amount: 105.97,
            status: "delivered".into(),
            tracking_number: None,
        }
    }

    fn state_after_ask(reply: &str) -> ConversationState {
        let mut s = ConversationState::new("s-1", "en");
        s.order_number = Some("ORD-2024-001".into());
        s.order = Some(order());
        s.messages
            .push(Message::assistant("Is this the correct order?"));
        s.messages.push(Message::user(reply));
        s
    }

    #[tokio::test]
    async fn first_pass_asks_with_masked_email() {
        let mut s = ConversationState::new("s-1", "en");
        s.order = Some(order());
        s.messages.push(Message::user("I want to return it"));

        let update = ConfirmOrderWorker.run(&s).await;
        let text = &update.messages[0].text;
        assert!(text.contains("jo***@example.com"));
        assert!(text.contains("Order #ORD-2024-001"));
        assert!(text.contains("Is this the correct order?"));
        assert!(matches!(update.user_confirmed_order, Patch::Keep));
    }

    #[tokio::test]
    async fn affirmative_reply_confirms() {
        let update = ConfirmOrderWorker.run(&state_after_ask("yes, that's it")).await;
        assert!(matches!(update.user_confirmed_order, Patch::Set(true)));
        assert!(matches!(update.order_number, Patch::Keep));
    }

    #[tokio::test]
    async fn negative_reply_resets_order_fields() {
        let update = ConfirmOrderWorker.run(&state_after_ask("no, that's wrong")).await;
        assert!(matches!(update.user_confirmed_order, Patch::Set(false)));
        assert!(matches!(update.order_number, Patch::Clear));
        assert!(matches!(update.order, Patch::Clear));
    }

    #[tokio::test]
    async fn does_not_reask_while_waiting() {
        let mut s = ConversationState::new("s-1", "en");
        s.order = Some(order());
        s.messages
            .push(Message::assistant("Is this the correct order?"));
        let update = ConfirmOrderWorker.run(&s).await;
        assert!(update.messages.is_empty());
    }

    #[tokio::test]
    async fn missing_order_sets_error() {
        let s = ConversationState::new("s-1", "en");
        let update = ConfirmOrderWorker.run(&s).await;
        assert!(matches!(&update.error, Patch::Set(e) if e.code == "NO_ORDER_DATA"));
    }
}

//! 订单状态展示 Worker
//!
//! 纯格式化：把已查到的订单投影渲染成状态卡片，并按状态附一句提示。

use async_trait::async_trait;

use crate::agent::state::{ConversationState, OrderSnapshot, StateUpdate};
use crate::agent::workers::{format_date, Worker};

fn status_remark(status: &str) -> &'static str {
    match status {
        "delivered" => "✅ Your order has been delivered! If you have any issues, please let us know.",
        "shipped" => "📦 Your order is on its way! Expected delivery soon.",
        "processing" => "⏳ Your order is being prepared for shipment.",
        "pending" => "📋 Your order has been received and will be processed shortly.",
        _ => "If you have any questions about your order, feel free to ask.",
    }
}

fn title_case(status: &str) -> String {
    let mut chars = status.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn format_status_card(order: &OrderSnapshot) -> String {
    let delivery = order
        .delivery_date
        .map(format_date)
        .unwrap_or_else(|| "Not yet delivered".to_string());

    let mut card = format!(
        "Here's the status of your order:\n\n\
         Order #{}\n\
         • Status: {}\n\
         • Order Date: {}\n\
         • Delivery: {}\n\
         • Total: ${:.2}\n\
         • Items: {} item(s)\n",
        order.order_id,
        title_case(&order.status),
        format_date(order.order_date),
        delivery,
        order.total_amount,
        order.items.len()
    );
    if let Some(tracking) = &order.tracking_number {
        card.push_str(&format!("• Tracking: {}\n", tracking));
    }
    card.push('\n');
    card.push_str(status_remark(&order.status));
    card
}

pub struct ShowOrderStatusWorker;

#[async_trait]
impl Worker for ShowOrderStatusWorker {
    fn name(&self) -> &'static str {
        "show_order_status"
    }

    async fn run(&self, state: &ConversationState) -> StateUpdate {
        match &state.order {
            Some(order) => StateUpdate::say(format_status_card(order)),
            None => StateUpdate::fail(
                "NO_ORDER_DATA",
                "no order data to display status for",
                "I'm sorry, I don't have your order details on hand. Could you share your order number again, please?",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::state::{OrderItem, Patch};
    use chrono::{Duration, Utc};

    fn order(status: &str, tracking: Option<&str>) -> OrderSnapshot {
        let now = Utc::now();
        OrderSnapshot {
            order_id: "ORD-2024-001".into(),
            customer_email: "john.smith@example.com".into(),
            first_name: "John".into(),
            last_name: "Smith".into(),
            contact_number: "+1-555-0101".into(),
            items: vec![
                OrderItem {
                    product_name: "Wireless Headphones".into(),
                    quantity: 1,
                    unit_price: 79.99,
                    category: Some("electronics".into()),
                },
                OrderItem {
                    product_name: "USB-C Cable".into(),
                    quantity: 2,
                    unit_price: 12.99,
                    category: Some("electronics".into()),
                },
            ],
            order_date: now - Duration::days(6),
            delivery_date: (status == "delivered").then(|| now - Duration::days(3)),
            total_amount: 105.97,
            status: status.into(),
            tracking_number: tracking.map(Into::into),
        }
    }

    #[tokio::test]
    async fn delivered_order_renders_full_card() {
        let mut s = ConversationState::new("s-1", "en");
        s.order = Some(order("delivered", None));

        let update = ShowOrderStatusWorker.run(&s).await;
        let text = &update.messages[0].text;
        assert!(text.contains("Order #ORD-2024-001"));
        assert!(text.contains("• Status: Delivered"));
        assert!(text.contains("• Total: $105.97"));
        assert!(text.contains("• Items: 2 item(s)"));
        assert!(text.contains("has been delivered"));
        assert!(!text.contains("Tracking"));
    }

    #[tokio::test]
    async fn shipped_order_shows_tracking_and_no_delivery_date() {
        let mut s = ConversationState::new("s-1", "en");
        s.order = Some(order("shipped", Some("TRK123456789")));

        let update = ShowOrderStatusWorker.run(&s).await;
        let text = &update.messages[0].text;
        assert!(text.contains("• Delivery: Not yet delivered"));
        assert!(text.contains("• Tracking: TRK123456789"));
        assert!(text.contains("on its way"));
    }

    #[tokio::test]
    async fn missing_order_sets_error() {
        let s = ConversationState::new("s-1", "en");
        let update = ShowOrderStatusWorker.run(&s).await;
        assert!(matches!(&update.error, Patch::Set(e) if e.code == "NO_ORDER_DATA"));
    }
}

//! Clerk Seed - 预置演示订单
//!
//! 向配置指定的 SQLite 数据库写入一组演示订单。客户与商品取自示例数据，
//! 送达日期相对当前时间生成，保证各个策略窗口分支都可演示：
//! 刚送达（退货退款都可）、退款窗口已过（仅退货）、两个窗口都过期、未送达。
//!
//! 运行方式：cargo run --bin clerk-seed

use anyhow::Context;
use chrono::{Duration, Utc};

use clerk::config::load_config;
use clerk::store::{OrderRecord, OrderRecordItem, SqliteStore};

fn item(id: &str, name: &str, qty: u32, unit: f64, category: &str) -> OrderRecordItem {
    OrderRecordItem {
        product_id: id.to_string(),
        product_name: name.to_string(),
        quantity: qty,
        unit_price: unit,
        total_price: unit * qty as f64,
        category: Some(category.to_string()),
    }
}

fn demo_orders() -> Vec<OrderRecord> {
    let now = Utc::now();
    vec![
        // 3 天前送达的电子产品：退货与退款窗口都在有效期内
        OrderRecord {
            order_number: "ORD-2024-001".into(),
            first_name: "John".into(),
            last_name: "Smith".into(),
            user_email: "john.smith@example.com".into(),
            user_contact_number: "+1-555-0101".into(),
            items: vec![
                item("PROD-001", "Wireless Headphones", 1, 79.99, "electronics"),
                item("PROD-002", "USB-C Cable", 2, 12.99, "electronics"),
            ],
            order_total: 105.97,
            order_date: now - Duration::days(6),
            delivery_date: Some(now - Duration::days(3)),
            status: "delivered".into(),
            tracking_number: None,
        },
        // 20 天前送达：退款窗口（14 天）已过，仅退货可行
        OrderRecord {
            order_number: "ORD-2024-002".into(),
            first_name: "Sarah".into(),
            last_name: "Johnson".into(),
            user_email: "sarah.johnson@example.com".into(),
            user_contact_number: "+1-555-0102".into(),
            items: vec![item("PROD-003", "Laptop Stand", 1, 45.00, "electronics")],
            order_total: 45.00,
            order_date: now - Duration::days(25),
            delivery_date: Some(now - Duration::days(20)),
            status: "delivered".into(),
            tracking_number: None,
        },
        // 运输中：尚未送达，不可退
        OrderRecord {
            order_number: "ORD-2024-003".into(),
            first_name: "Michael".into(),
            last_name: "Brown".into(),
            user_email: "michael.brown@example.com".into(),
            user_contact_number: "+1-555-0103".into(),
            items: vec![
                item("PROD-004", "Mechanical Keyboard", 1, 129.99, "electronics"),
                item("PROD-005", "Gaming Mouse", 1, 59.99, "electronics"),
                item("PROD-006", "Mouse Pad", 1, 19.99, "electronics"),
            ],
            order_total: 209.97,
            order_date: now - Duration::days(4),
            delivery_date: None,
            status: "in_transit".into(),
            tracking_number: Some("TRK-889441205".into()),
        },
        // 处理中
        OrderRecord {
            order_number: "ORD-2024-004".into(),
            first_name: "Emily".into(),
            last_name: "Davis".into(),
            user_email: "emily.davis@example.com".into(),
            user_contact_number: "+1-555-0104".into(),
            items: vec![
                item("PROD-007", "Webcam HD", 1, 89.99, "electronics"),
                item("PROD-008", "Ring Light", 1, 34.99, "electronics"),
            ],
            order_total: 124.98,
            order_date: now - Duration::days(1),
            delivery_date: None,
            status: "processing".into(),
            tracking_number: None,
        },
        // 半年前送达：两个窗口都已过期
        OrderRecord {
            order_number: "ORD-2024-005".into(),
            first_name: "David".into(),
            last_name: "Wilson".into(),
            user_email: "david.wilson@example.com".into(),
            user_contact_number: "+1-555-0105".into(),
            items: vec![
                item("PROD-009", "Bluetooth Speaker", 2, 49.99, "electronics"),
                item("PROD-010", "Phone Case", 1, 24.99, "electronics"),
            ],
            order_total: 124.97,
            order_date: now - Duration::days(185),
            delivery_date: Some(now - Duration::days(180)),
            status: "delivered".into(),
            tracking_number: None,
        },
        // 服装类目（60/30 窗口）：送达 20 天，两个窗口都有效
        OrderRecord {
            order_number: "ORD-2024-006".into(),
            first_name: "Lisa".into(),
            last_name: "Martinez".into(),
            user_email: "lisa.martinez@example.com".into(),
            user_contact_number: "+1-555-0106".into(),
            items: vec![item("PROD-011", "Winter Jacket", 1, 119.99, "clothing")],
            order_total: 119.99,
            order_date: now - Duration::days(24),
            delivery_date: Some(now - Duration::days(20)),
            status: "delivered".into(),
            tracking_number: None,
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    clerk::observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let store =
        SqliteStore::open(&cfg.store.database_path).context("Failed to open database")?;

    let orders = demo_orders();
    for order in &orders {
        store
            .insert_order(order)
            .await
            .with_context(|| format!("Failed to insert {}", order.order_number))?;
        tracing::info!(order_number = %order.order_number, status = %order.status, "seeded");
    }

    println!(
        "Seeded {} demo orders into {}",
        orders.len(),
        cfg.store.database_path.display()
    );
    Ok(())
}

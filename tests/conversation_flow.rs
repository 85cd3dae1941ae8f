//! 多轮会话集成测试
//!
//! 用脚本化 NLU 精确控制分类 / 抽取结果，覆盖：完整退款流程、跨实例恢复、
//! 工单幂等、订单状态查询、资格不满足。

use std::sync::Arc;

use chrono::{Duration, Utc};

use clerk::agent::workers::MockNotifier;
use clerk::llm::{NluClient, ScriptedNlu};
use clerk::store::{CheckpointStore, MemoryStore, OrderRecord, OrderRecordItem, SqliteStore};
use clerk::{AgentGraph, AgentService};

fn order_fixture(
    number: &str,
    delivered_days_ago: Option<i64>,
    status: &str,
    tracking: Option<&str>,
) -> OrderRecord {
    let now = Utc::now();
    OrderRecord {
        order_number: number.into(),
        first_name: "John".into(),
        last_name: "Smith".into(),
        user_email: "john.smith@example.com".into(),
        user_contact_number: "+1-555-0101".into(),
        items: vec![
            OrderRecordItem {
                product_id: "PROD-001".into(),
                product_name: "Wireless Headphones".into(),
                quantity: 1,
                unit_price: 79.99,
                total_price: 79.99,
                category: Some("electronics".into()),
            },
            OrderRecordItem {
                product_id: "PROD-002".into(),
                product_name: "USB-C Cable".into(),
                quantity: 2,
                unit_price: 12.99,
                total_price: 25.98,
                category: Some("electronics".into()),
            },
        ],
        order_total: 105.97,
        order_date: now - Duration::days(delivered_days_ago.unwrap_or(2) + 3),
        delivery_date: delivered_days_ago.map(|d| now - Duration::days(d)),
        status: status.into(),
        tracking_number: tracking.map(Into::into),
    }
}

async fn seeded_memory_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_order(order_fixture("ORD-2024-001", Some(3), "delivered", None))
        .await;
    store
        .insert_order(order_fixture(
            "ORD-2024-003",
            None,
            "in_transit",
            Some("TRK-889441205"),
        ))
        .await;
    store
        .insert_order(order_fixture("ORD-2024-005", Some(180), "delivered", None))
        .await;
    store
}

fn service(store: Arc<MemoryStore>, nlu: Arc<dyn NluClient>) -> AgentService {
    let graph = AgentGraph::new(nlu, store.clone(), store.clone(), Arc::new(MockNotifier));
    AgentService::new(graph, store, 25, "en")
}

#[tokio::test]
async fn full_refund_conversation_creates_ticket() {
    let store = seeded_memory_store().await;
    // 分类 → 抽取失败 → 抽取成功，之后都不再调用 NLU
    let nlu = Arc::new(ScriptedNlu::new(["refund", "NONE", "ORD-2024-001"]));
    let svc = service(store.clone(), nlu);

    let t1 = svc
        .process_turn("s-refund", "Hi, I'd like my money back for the headphones")
        .await
        .unwrap();
    assert!(t1.success);
    assert!(t1.assistant_messages[0].to_lowercase().contains("order number"));

    let t2 = svc
        .process_turn("s-refund", "It's ORD-2024-001")
        .await
        .unwrap();
    let summary = t2.assistant_messages.join("\n");
    assert!(summary.contains("Order #ORD-2024-001"));
    assert!(summary.contains("jo***@example.com"));
    assert!(summary.contains("Is this the correct order?"));

    let t3 = svc.process_turn("s-refund", "yes").await.unwrap();
    let choice = t3.assistant_messages.join("\n");
    assert!(choice.contains("return") && choice.contains("refund"));

    let t4 = svc.process_turn("s-refund", "refund").await.unwrap();
    assert!(t4.success);
    let closing = t4.assistant_messages.join("\n");
    assert!(closing.contains("refund ticket"));
    assert!(closing.contains("REF-"));
    assert!(closing.contains("All done"));
    assert!(closing.contains("original payment method"));

    assert_eq!(store.ticket_count().await, 1);

    // 会话已到终点
    let state = store.load("s-refund").await.unwrap().unwrap();
    assert!(state.conversation_complete);
}

#[tokio::test]
async fn repeated_request_reuses_existing_ticket() {
    let store = seeded_memory_store().await;
    let nlu = Arc::new(ScriptedNlu::new(["refund", "NONE", "ORD-2024-001"]));
    let svc = service(store.clone(), nlu.clone());

    svc.process_turn("s-dup", "I want a refund").await.unwrap();
    svc.process_turn("s-dup", "It's ORD-2024-001").await.unwrap();
    svc.process_turn("s-dup", "yes").await.unwrap();
    let first = svc.process_turn("s-dup", "refund").await.unwrap();
    let first_text = first.assistant_messages.join("\n");
    let ticket_id = first_text
        .split("**")
        .find(|s| s.starts_with("REF-"))
        .unwrap()
        .to_string();
    assert_eq!(store.ticket_count().await, 1);

    // 终点之后再次请求同一订单退款：工作流重置，但台账幂等命中，不产生第二张工单
    nlu.push("refund");
    nlu.push("ORD-2024-001");
    svc.process_turn("s-dup", "I'd like a refund for ORD-2024-001 again")
        .await
        .unwrap();
    svc.process_turn("s-dup", "yes").await.unwrap();
    let repeat = svc.process_turn("s-dup", "refund").await.unwrap();

    assert_eq!(store.ticket_count().await, 1);
    assert!(repeat.assistant_messages.join("\n").contains(&ticket_id));
}

#[tokio::test]
async fn conversation_resumes_across_service_instances() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("clerk.db");

    let store = Arc::new(SqliteStore::open(&db_path).unwrap());
    store
        .insert_order(&order_fixture("ORD-2024-001", Some(3), "delivered", None))
        .await
        .unwrap();

    // 第一个实例走到订单确认
    {
        let nlu = Arc::new(ScriptedNlu::new(["refund", "NONE", "ORD-2024-001"]));
        let graph = AgentGraph::new(
            nlu,
            store.clone(),
            store.clone(),
            Arc::new(MockNotifier),
        );
        let svc = AgentService::new(graph, store.clone(), 25, "en");
        svc.process_turn("s-resume", "I'd like a refund please")
            .await
            .unwrap();
        svc.process_turn("s-resume", "It's ORD-2024-001")
            .await
            .unwrap();
    }

    // 新实例（模拟进程重启）从检查点继续
    let store = Arc::new(SqliteStore::open(&db_path).unwrap());
    let nlu = Arc::new(ScriptedNlu::new(Vec::<String>::new()));
    let graph = AgentGraph::new(
        nlu,
        store.clone(),
        store.clone(),
        Arc::new(MockNotifier),
    );
    let svc = AgentService::new(graph, store.clone(), 25, "en");

    let t3 = svc.process_turn("s-resume", "yes").await.unwrap();
    assert!(t3.success);
    let t4 = svc.process_turn("s-resume", "refund").await.unwrap();
    assert!(t4.assistant_messages.join("\n").contains("REF-"));

    let state = store.load("s-resume").await.unwrap().unwrap();
    assert!(state.conversation_complete);
    // 恢复后消息历史完整（4 条用户消息 + 各轮助手消息）
    assert_eq!(
        state
            .messages
            .iter()
            .filter(|m| matches!(m.role, clerk::agent::state::Role::User))
            .count(),
        4
    );
}

#[tokio::test]
async fn order_status_inquiry_completes_in_one_turn() {
    let store = seeded_memory_store().await;
    let nlu = Arc::new(ScriptedNlu::new(["order_status", "ORD-2024-003"]));
    let svc = service(store.clone(), nlu);

    let outcome = svc
        .process_turn("s-status", "Where is my order ORD-2024-003")
        .await
        .unwrap();
    assert!(outcome.success);
    let text = outcome.assistant_messages.join("\n");
    assert!(text.contains("Order #ORD-2024-003"));
    assert!(text.contains("• Delivery: Not yet delivered"));
    assert!(text.contains("• Tracking: TRK-889441205"));

    // 状态查询不产生工单，且一轮内到达终点
    assert_eq!(store.ticket_count().await, 0);
    let state = store.load("s-status").await.unwrap().unwrap();
    assert!(state.conversation_complete);
}

#[tokio::test]
async fn expired_windows_end_without_ticket() {
    let store = seeded_memory_store().await;
    let nlu = Arc::new(ScriptedNlu::new(["return", "ORD-2024-005"]));
    let svc = service(store.clone(), nlu);

    svc.process_turn("s-expired", "I want to return ORD-2024-005")
        .await
        .unwrap();
    let outcome = svc.process_turn("s-expired", "yes").await.unwrap();

    assert!(outcome.success);
    let text = outcome.assistant_messages.join("\n");
    assert!(text.contains("isn't eligible"));
    assert_eq!(store.ticket_count().await, 0);

    let state = store.load("s-expired").await.unwrap().unwrap();
    assert!(state.conversation_complete);
    assert!(!state.eligibility.unwrap().any_eligible());
}

#[tokio::test]
async fn declining_confirmation_restarts_collection() {
    let store = seeded_memory_store().await;
    let nlu = Arc::new(ScriptedNlu::new(["return", "NONE", "ORD-2024-001"]));
    let svc = service(store.clone(), nlu);

    svc.process_turn("s-decline", "I want to return something")
        .await
        .unwrap();
    svc.process_turn("s-decline", "It's ORD-2024-001")
        .await
        .unwrap();
    let outcome = svc.process_turn("s-decline", "no, that's wrong").await.unwrap();

    assert!(outcome.success);
    assert!(outcome
        .assistant_messages
        .join("\n")
        .contains("Let's start over"));

    let state = store.load("s-decline").await.unwrap().unwrap();
    assert!(state.order_number.is_none());
    assert!(state.order.is_none());
    assert_eq!(store.ticket_count().await, 0);
}

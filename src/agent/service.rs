//! 编排层：图 + 服务
//!
//! AgentGraph 把十一个 Worker 装配成按 Step 分发的执行体；AgentService 驱动单轮循环：
//! 读检查点 → 追加用户消息 → route/run 循环（每步落盘）→ 暂停或收尾后返回本轮助手消息。

use std::sync::Arc;

use crate::agent::error::AgentError;
use crate::agent::state::{ConversationState, Message, Role};
use crate::agent::supervisor::{route, Route, Step};
use crate::agent::workers::{
    CheckPolicyWorker, ClassifyIntentWorker, CollectOrderNumberWorker, ConfirmOrderWorker,
    DecideActionWorker, FinalizeWorker, LookupOrderWorker, Notifier, NotifyWorker,
    ProcessTicketWorker, ShowOrderStatusWorker, Worker,
};
use crate::llm::NluClient;
use crate::store::{CheckpointStore, OrderStore, TicketLedger};

/// 装配好的工作流图：Step → Worker 的静态映射
pub struct AgentGraph {
    classify_intent: ClassifyIntentWorker,
    collect_order_number: CollectOrderNumberWorker,
    lookup_order: LookupOrderWorker,
    confirm_order: ConfirmOrderWorker,
    check_policy: CheckPolicyWorker,
    decide_action: DecideActionWorker,
    process_return: ProcessTicketWorker,
    process_refund: ProcessTicketWorker,
    notify: NotifyWorker,
    show_order_status: ShowOrderStatusWorker,
    finalize: FinalizeWorker,
}

impl AgentGraph {
    pub fn new(
        nlu: Arc<dyn NluClient>,
        orders: Arc<dyn OrderStore>,
        tickets: Arc<dyn TicketLedger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            classify_intent: ClassifyIntentWorker::new(nlu.clone()),
            collect_order_number: CollectOrderNumberWorker::new(nlu),
            lookup_order: LookupOrderWorker::new(orders),
            confirm_order: ConfirmOrderWorker,
            check_policy: CheckPolicyWorker,
            decide_action: DecideActionWorker,
            process_return: ProcessTicketWorker::return_worker(tickets.clone()),
            process_refund: ProcessTicketWorker::refund_worker(tickets),
            notify: NotifyWorker::new(notifier),
            show_order_status: ShowOrderStatusWorker,
            finalize: FinalizeWorker,
        }
    }

    fn worker(&self, step: Step) -> &dyn Worker {
        match step {
            Step::ClassifyIntent => &self.classify_intent,
            Step::CollectOrderNumber => &self.collect_order_number,
            Step::LookupOrder => &self.lookup_order,
            Step::ConfirmOrder => &self.confirm_order,
            Step::CheckPolicy => &self.check_policy,
            Step::DecideAction => &self.decide_action,
            Step::ProcessReturn => &self.process_return,
            Step::ProcessRefund => &self.process_refund,
            Step::Notify => &self.notify,
            Step::ShowOrderStatus => &self.show_order_status,
            Step::Finalize => &self.finalize,
        }
    }
}

/// 单轮处理结果
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    /// 本轮新增的助手消息（按产生顺序）
    pub assistant_messages: Vec<String>,
    /// 本轮结束时状态中是否无错误
    pub success: bool,
    /// 状态中错误的诊断文本（用户可读的道歉已在 assistant_messages 里）
    pub error_detail: Option<String>,
}

/// 会话级入口：持有图、检查点存储与运行参数
pub struct AgentService {
    graph: AgentGraph,
    checkpoints: Arc<dyn CheckpointStore>,
    max_steps_per_turn: usize,
    locale: String,
}

impl AgentService {
    pub fn new(
        graph: AgentGraph,
        checkpoints: Arc<dyn CheckpointStore>,
        max_steps_per_turn: usize,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            graph,
            checkpoints,
            max_steps_per_turn,
            locale: locale.into(),
        }
    }

    /// 处理一条用户消息，驱动工作流直到暂停或收尾。
    ///
    /// 每执行完一步就写一次检查点，进程在任意步后中断都能从落盘状态恢复；
    /// Worker 幂等保证恢复后重放同一步无副作用。
    pub async fn process_turn(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<TurnOutcome, AgentError> {
        let mut state = match self.checkpoints.load(session_id).await? {
            Some(state) => state,
            None => ConversationState::new(session_id, &self.locale),
        };

        // 上一轮已到终点：保留消息历史，工作流字段归零后重新开始
        if state.conversation_complete {
            tracing::debug!(%session_id, "previous workflow complete, resetting for new request");
            state.reset_workflow();
        }

        state.messages.push(Message::user(text));
        // 新用户消息解除错误暂停
        state.error = None;
        let turn_start = state.messages.len();
        self.checkpoints.save(session_id, &state).await?;

        let mut steps = 0usize;
        loop {
            let step = match route(&state) {
                Route::Pause => break,
                Route::Run(step) => step,
            };

            if steps >= self.max_steps_per_turn {
                tracing::error!(
                    %session_id,
                    steps,
                    next = step.name(),
                    "turn did not converge within step limit"
                );
                self.checkpoints.save(session_id, &state).await?;
                return Err(AgentError::StepLimitExceeded(self.max_steps_per_turn));
            }
            steps += 1;

            let worker = self.graph.worker(step);
            tracing::debug!(%session_id, step = worker.name(), steps, "running step");
            let update = worker.run(&state).await;
            state.apply(update);
            self.checkpoints.save(session_id, &state).await?;

            // 收尾是终点步：执行后本轮结束
            if step == Step::Finalize {
                break;
            }
        }

        let assistant_messages = state.messages[turn_start..]
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.text.clone())
            .collect();
        let error_detail = state
            .error
            .as_ref()
            .map(|e| format!("{}: {}", e.code, e.message));

        Ok(TurnOutcome {
            assistant_messages,
            success: state.error.is_none(),
            error_detail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::workers::MockNotifier;
    use crate::llm::ScriptedNlu;
    use crate::store::{MemoryStore, OrderRecord, OrderRecordItem};
    use chrono::{Duration, Utc};

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store
            .insert_order(OrderRecord {
                order_number: "ORD-2024-001".into(),
                first_name: "John".into(),
                last_name: "Smith".into(),
                user_email: "john.smith@example.com".into(),
                user_contact_number: "+1-555-0101".into(),
                items: vec![OrderRecordItem {
                    product_id: "PROD-100".into(),
                    product_name: "Wireless Headphones".into(),
                    quantity: 1,
                    unit_price: 79.99,
                    total_price: 79.99,
                    category: Some("electronics".into()),
                }],
                order_total: 105.97,
                order_date: now - Duration::days(6),
                delivery_date: Some(now - Duration::days(3)),
                status: "delivered".into(),
                tracking_number: None,
            })
            .await;
        store
    }

    fn service(store: Arc<MemoryStore>, nlu: Arc<dyn NluClient>) -> AgentService {
        let graph = AgentGraph::new(nlu, store.clone(), store.clone(), Arc::new(MockNotifier));
        AgentService::new(graph, store, 25, "en")
    }

    #[tokio::test]
    async fn first_turn_classifies_and_asks_for_order_number() {
        let store = seeded_store().await;
        let nlu = Arc::new(ScriptedNlu::new(["return", "NONE"]));
        let svc = service(store, nlu);

        let outcome = svc
            .process_turn("s-1", "I want to return my order")
            .await
            .unwrap();
        assert!(outcome.success);
        assert!(outcome.assistant_messages[0]
            .to_lowercase()
            .contains("order number"));
    }

    #[tokio::test]
    async fn unknown_order_sets_error_and_next_turn_recovers() {
        let store = seeded_store().await;
        let nlu = Arc::new(ScriptedNlu::new(["return", "NONE", "ORD-9999-999", "ORD-2024-001"]));
        let svc = service(store, nlu);

        svc.process_turn("s-1", "I want to return my order")
            .await
            .unwrap();
        let outcome = svc
            .process_turn("s-1", "it's ORD-9999-999")
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.error_detail.as_ref().unwrap().contains("ORDER_NOT_FOUND"));

        // 下一条用户消息解锁并重新收集订单号
        let outcome = svc
            .process_turn("s-1", "sorry, it's ORD-2024-001")
            .await
            .unwrap();
        assert!(outcome.success);
        assert!(outcome
            .assistant_messages
            .iter()
            .any(|m| m.contains("Is this the correct order?")));
    }

    #[tokio::test]
    async fn step_limit_returns_error_with_state_saved() {
        let store = seeded_store().await;
        let nlu = Arc::new(ScriptedNlu::new(["return", "NONE"]));
        let graph = AgentGraph::new(
            nlu,
            store.clone(),
            store.clone(),
            Arc::new(MockNotifier),
        );
        // 上限 0：任何需要执行步骤的轮次都立即超限
        let svc = AgentService::new(graph, store.clone(), 0, "en");

        let err = svc
            .process_turn("s-1", "I want to return my order")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::StepLimitExceeded(0)));
        // 用户消息已落盘
        let state = store.load("s-1").await.unwrap().unwrap();
        assert_eq!(state.messages.len(), 1);
    }
}

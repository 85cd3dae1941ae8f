//! 监督路由器：状态 → 下一步 的纯决策函数
//!
//! 状态机没有独立的 state-id，状态隐含在「哪些字段已填」的组合里。
//! 规则按优先级排列，首条命中即返回；每个 Worker 执行后重新求值。

use crate::agent::state::{ConversationState, DesiredAction, Intent, Role};

/// 工作流步骤（编译期固定的封闭集合）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    ClassifyIntent,
    CollectOrderNumber,
    LookupOrder,
    ConfirmOrder,
    CheckPolicy,
    DecideAction,
    ProcessReturn,
    ProcessRefund,
    Notify,
    ShowOrderStatus,
    Finalize,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::ClassifyIntent => "classify_intent",
            Step::CollectOrderNumber => "collect_order_number",
            Step::LookupOrder => "lookup_order",
            Step::ConfirmOrder => "confirm_order",
            Step::CheckPolicy => "check_policy",
            Step::DecideAction => "decide_action",
            Step::ProcessReturn => "process_return",
            Step::ProcessRefund => "process_refund",
            Step::Notify => "notify",
            Step::ShowOrderStatus => "show_order_status",
            Step::Finalize => "finalize",
        }
    }
}

/// 路由结果：执行某步，或暂停等待用户输入
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Run(Step),
    Pause,
}

/// 最近一条助手消息是否在向用户提问（文本启发式，行为与原始实现对齐）
fn awaiting_user_reply(state: &ConversationState) -> bool {
    match state.last_message() {
        Some(m) if m.role == Role::Assistant => {
            m.text.contains('?') || m.text.to_lowercase().contains("please")
        }
        _ => false,
    }
}

/// 最近一条助手消息是否已展示过订单状态详情
fn status_already_shown(state: &ConversationState) -> bool {
    match state.last_message() {
        Some(m) if m.role == Role::Assistant => {
            let text = m.text.to_lowercase();
            text.contains("status:") || text.contains("order #") || text.contains("delivery")
        }
        _ => false,
    }
}

/// 路由决策。纯函数：同一状态重复求值必得同一结果。
pub fn route(state: &ConversationState) -> Route {
    // 1. 有错误：本轮终止，等用户下一条消息解锁
    if state.error.is_some() {
        tracing::debug!("route: pause (error set)");
        return Route::Pause;
    }

    // 2. 刚向用户提了问题：暂停等回复
    if awaiting_user_reply(state) {
        tracing::debug!("route: pause (awaiting user reply)");
        return Route::Pause;
    }

    // 3. 意图未定：先分类
    let intent = match state.intent {
        None => return Route::Run(Step::ClassifyIntent),
        Some(i) => i,
    };

    // 4. 需要订单的意图但还没有订单号：收集订单号
    if intent.requires_order() && state.order_number.is_none() {
        return Route::Run(Step::CollectOrderNumber);
    }

    // 5. 有订单号但订单未加载：查库
    if state.order_number.is_some() && state.order.is_none() {
        return Route::Run(Step::LookupOrder);
    }

    // 6. 订单状态查询：已展示则收尾，否则展示
    if intent == Intent::OrderStatus && state.order.is_some() {
        if status_already_shown(state) {
            return Route::Run(Step::Finalize);
        }
        return Route::Run(Step::ShowOrderStatus);
    }

    // 7. 退货 / 退款：订单已加载但未确认
    if state.order.is_some()
        && state.user_confirmed_order.is_none()
        && matches!(intent, Intent::Return | Intent::Refund)
    {
        return Route::Run(Step::ConfirmOrder);
    }

    // 8. 用户否认订单：收尾
    if state.user_confirmed_order == Some(false) {
        return Route::Run(Step::Finalize);
    }

    // 9. 已确认但资格未算：查策略
    if state.user_confirmed_order == Some(true) && state.eligibility.is_none() {
        return Route::Run(Step::CheckPolicy);
    }

    if let Some(eligibility) = &state.eligibility {
        // 10. 有资格但尚未决定动作
        if eligibility.any_eligible() && state.desired_action.is_none() {
            return Route::Run(Step::DecideAction);
        }

        // 11. 两个窗口都不满足：收尾
        if !eligibility.any_eligible() {
            return Route::Run(Step::Finalize);
        }
    }

    let ticket_id = state.action_ticket.as_ref().and_then(|t| t.id.as_ref());

    // 12/13. 已选动作但工单未建：建退货 / 退款工单
    if ticket_id.is_none() {
        match state.desired_action {
            Some(DesiredAction::Return) => return Route::Run(Step::ProcessReturn),
            Some(DesiredAction::Refund) => return Route::Run(Step::ProcessRefund),
            _ => {}
        }
    }

    // 14. 有工单但还没通知客户：发通知
    if ticket_id.is_some() && state.notification_status.is_none() {
        return Route::Run(Step::Notify);
    }

    // 15. 通知已发：收尾
    if state.notification_status.is_some() {
        return Route::Run(Step::Finalize);
    }

    // 16/17. 其他意图或兜底：收尾
    Route::Run(Step::Finalize)
}

//! 会话状态模型
//!
//! ConversationState 是贯穿所有 Worker 的唯一聚合；Worker 不就地修改状态，
//! 而是返回 StateUpdate（部分更新），由编排循环合并：messages 为追加，其余字段为「有则替换」。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// 用户意图（封闭集合，NLU 输出不在集合内时强制归为 Other）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Return,
    Refund,
    OrderStatus,
    Other,
}

impl Intent {
    /// 该意图是否需要先拿到订单号
    pub fn requires_order(self) -> bool {
        matches!(self, Intent::Return | Intent::Refund | Intent::OrderStatus)
    }

    /// 解析 NLU 的单词输出；未知值归为 None（调用方退回 Other）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "return" => Some(Intent::Return),
            "refund" => Some(Intent::Refund),
            "order_status" => Some(Intent::OrderStatus),
            "other" => Some(Intent::Other),
            _ => None,
        }
    }
}

/// 用户最终选择的处理方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredAction {
    Return,
    Refund,
    Cancel,
}

impl DesiredAction {
    pub fn as_str(self) -> &'static str {
        match self {
            DesiredAction::Return => "return",
            DesiredAction::Refund => "refund",
            DesiredAction::Cancel => "cancel",
        }
    }
}

/// 订单条目（内部投影）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    /// 商品类目，决定退货 / 退款窗口
    pub category: Option<String>,
}

/// 外部订单记录归一化后的只读投影
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: String,
    pub customer_email: String,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: String,
    pub items: Vec<OrderItem>,
    pub order_date: DateTime<Utc>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub total_amount: f64,
    pub status: String,
    pub tracking_number: Option<String>,
}

/// 退货 / 退款资格（策略引擎输出，值类型）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Eligibility {
    pub is_return_eligible: bool,
    pub is_refund_eligible: bool,
    pub reason: String,
    pub policy_version: String,
    /// 退货窗口天数（类目覆盖后）
    pub cutoff_days: i64,
    pub days_since_delivery: Option<i64>,
}

impl Eligibility {
    /// 任一窗口满足即视为可处理
    pub fn any_eligible(&self) -> bool {
        self.is_return_eligible || self.is_refund_eligible
    }
}

/// 工单状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Created,
    Duplicate,
    Failed,
}

/// 处理工单（嵌入状态的值类型）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionTicket {
    pub id: Option<String>,
    pub status: TicketStatus,
}

/// 通知发送结果
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Sent,
    Failed,
}

/// 状态内的用户可见错误；存在即强制暂停，由下一条用户消息解锁
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// 会话元信息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Meta {
    pub session_id: String,
    pub idempotency_key: Option<String>,
    pub locale: String,
}

/// 会话状态聚合：一个会话独占一份，按步持久化
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationState {
    /// 只增不减的消息历史
    pub messages: Vec<Message>,
    pub intent: Option<Intent>,
    pub order_number: Option<String>,
    pub order: Option<OrderSnapshot>,
    pub order_match_confidence: Option<f64>,
    pub user_confirmed_order: Option<bool>,
    pub eligibility: Option<Eligibility>,
    pub desired_action: Option<DesiredAction>,
    pub action_ticket: Option<ActionTicket>,
    pub notification_status: Option<NotificationStatus>,
    /// 工作流到达终点后置位，允许下一条用户消息重新分类意图
    pub conversation_complete: bool,
    pub error: Option<ErrorInfo>,
    pub meta: Meta,
}

impl ConversationState {
    /// 新会话初始状态：除 meta 外所有字段未设置
    pub fn new(session_id: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            intent: None,
            order_number: None,
            order: None,
            order_match_confidence: None,
            user_confirmed_order: None,
            eligibility: None,
            desired_action: None,
            action_ticket: None,
            notification_status: None,
            conversation_complete: false,
            error: None,
            meta: Meta {
                session_id: session_id.into(),
                idempotency_key: None,
                locale: locale.into(),
            },
        }
    }

    /// 最近一条消息
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// 最近一条用户消息的文本
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text.as_str())
    }

    /// 合并一次部分更新：messages 追加，其余字段按 Patch 语义替换 / 清除
    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        update.intent.apply(&mut self.intent);
        update.order_number.apply(&mut self.order_number);
        update.order.apply(&mut self.order);
        update
            .order_match_confidence
            .apply(&mut self.order_match_confidence);
        update
            .user_confirmed_order
            .apply(&mut self.user_confirmed_order);
        update.eligibility.apply(&mut self.eligibility);
        update.desired_action.apply(&mut self.desired_action);
        update.action_ticket.apply(&mut self.action_ticket);
        update
            .notification_status
            .apply(&mut self.notification_status);
        if let Some(done) = update.conversation_complete {
            self.conversation_complete = done;
        }
        update.error.apply(&mut self.error);
        update.idempotency_key.apply(&mut self.meta.idempotency_key);
    }

    /// 工作流重置：终点之后收到新用户消息时调用。
    /// 消息历史与会话身份保留，其余字段回到初始态。
    pub fn reset_workflow(&mut self) {
        self.intent = None;
        self.order_number = None;
        self.order = None;
        self.order_match_confidence = None;
        self.user_confirmed_order = None;
        self.eligibility = None;
        self.desired_action = None;
        self.action_ticket = None;
        self.notification_status = None;
        self.conversation_complete = false;
        self.error = None;
        self.meta.idempotency_key = None;
    }
}

/// 三态补丁：保持 / 设置 / 清除
///
/// 「清除」是确认否认路径的硬需求（order_number 与 order 需显式回到未设置）。
#[derive(Clone, Debug, Default)]
pub enum Patch<T> {
    #[default]
    Keep,
    Set(T),
    Clear,
}

impl<T> Patch<T> {
    fn apply(self, slot: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Set(v) => *slot = Some(v),
            Patch::Clear => *slot = None,
        }
    }
}

/// Worker 产出的部分更新；省略（Keep）的字段保持不变
#[derive(Clone, Debug, Default)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub intent: Patch<Intent>,
    pub order_number: Patch<String>,
    pub order: Patch<OrderSnapshot>,
    pub order_match_confidence: Patch<f64>,
    pub user_confirmed_order: Patch<bool>,
    pub eligibility: Patch<Eligibility>,
    pub desired_action: Patch<DesiredAction>,
    pub action_ticket: Patch<ActionTicket>,
    pub notification_status: Patch<NotificationStatus>,
    pub conversation_complete: Option<bool>,
    pub error: Patch<ErrorInfo>,
    pub idempotency_key: Patch<String>,
}

impl StateUpdate {
    /// 仅追加一条助手消息的更新
    pub fn say(text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(text)],
            ..Default::default()
        }
    }

    /// 设置错误并附带一条道歉消息（错误路径永远不给用户看裸错误码）
    pub fn fail(code: &str, detail: impl Into<String>, apology: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(apology)],
            error: Patch::Set(ErrorInfo::new(code, detail)),
            ..Default::default()
        }
    }

    /// 链式追加一条助手消息
    pub fn and_say(mut self, text: impl Into<String>) -> Self {
        self.messages.push(Message::assistant(text));
        self
    }
}

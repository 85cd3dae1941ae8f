//! Worker 层：十一个单一职责的状态转换步骤
//!
//! 共同契约：输入当前状态（外加所需能力句柄），输出 StateUpdate；
//! 对同一状态重复调用必须幂等（已设字段不重算、已提问不重问）；
//! 副作用 Worker 不向上抛错，失败编码进 error / 工单状态并附用户可读消息。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::agent::state::{ConversationState, StateUpdate};

pub mod classify_intent;
pub mod collect_order_number;
pub mod confirm_order;
pub mod decide_action;
pub mod finalize;
pub mod lookup_order;
pub mod notify;
pub mod policy_check;
pub mod process_ticket;
pub mod show_order_status;

pub use classify_intent::ClassifyIntentWorker;
pub use collect_order_number::CollectOrderNumberWorker;
pub use confirm_order::ConfirmOrderWorker;
pub use decide_action::DecideActionWorker;
pub use finalize::FinalizeWorker;
pub use lookup_order::LookupOrderWorker;
pub use notify::{MockNotifier, Notifier, NotifyWorker};
pub use policy_check::CheckPolicyWorker;
pub use process_ticket::ProcessTicketWorker;
pub use show_order_status::ShowOrderStatusWorker;

/// 工作流步骤的统一接口
#[async_trait]
pub trait Worker: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: &ConversationState) -> StateUpdate;
}

/// 遮蔽邮箱：本地部分保留前两个字符，如 jo***@example.com
/// 按字符计数而非字节，多字节本地部分不会落在字符边界之外
pub(crate) fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if local.chars().count() > 2 => {
            let prefix: String = local.chars().take(2).collect();
            format!("{}***@{}", prefix, domain)
        }
        Some((_, domain)) => format!("***@{}", domain),
        None => "***".to_string(),
    }
}

/// 按词边界判断文本是否含某个小写词（避免 "know" 命中 "no"）
pub(crate) fn contains_token(text: &str, token: &str) -> bool {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == token)
}

/// 用户可读的日期格式（October 18, 2024）
pub(crate) fn format_date(date: DateTime<Utc>) -> String {
    date.format("%B %d, %Y").to_string()
}

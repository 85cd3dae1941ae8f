//! 订单号收集 Worker
//!
//! 正则优先，抽不到再用 NLU；若上一条助手消息已在问订单号则不重复提问
//! （防止用户尚未回复时陷入提问循环）。

use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::agent::state::{ConversationState, Patch, Role, StateUpdate};
use crate::agent::workers::Worker;
use crate::llm::NluClient;

/// 订单号形态：3 位字母/数字 + 可选连字符 + ≥6 位数字，或 ≥10 位纯数字
fn order_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b([A-Z0-9]{3}-?[0-9]{6,}|[0-9]{10,})\b").unwrap())
}

const EXTRACTION_PROMPT: &str = "You are helping extract an order number from a customer message.
Order numbers typically look like: ORD-123456, ABC-123456, or similar alphanumeric codes.

If you find an order number in the message, respond with ONLY the order number.
If you don't find one, respond with ONLY the word \"NONE\".";

const ASK_FIRST: &str =
    "I can help with that. What's your **order number**? It usually looks like **ORD-123456**.";
const ASK_AGAIN: &str = "I need your order number to help you. It usually looks like \
    **ORD-123456** or a similar code. Can you provide it?";

pub struct CollectOrderNumberWorker {
    nlu: Arc<dyn NluClient>,
}

impl CollectOrderNumberWorker {
    pub fn new(nlu: Arc<dyn NluClient>) -> Self {
        Self { nlu }
    }

    fn found(order_number: String) -> StateUpdate {
        let note = format!("Great! Let me look up order **{}** for you...", order_number);
        StateUpdate {
            order_number: Patch::Set(order_number),
            ..Default::default()
        }
        .and_say(note)
    }
}

#[async_trait]
impl Worker for CollectOrderNumberWorker {
    fn name(&self) -> &'static str {
        "collect_order_number"
    }

    async fn run(&self, state: &ConversationState) -> StateUpdate {
        if let Some(existing) = &state.order_number {
            if existing.len() >= 6 {
                return StateUpdate::default();
            }
        }

        // 刚问过订单号且用户还没回：不重复提问
        if let Some(m) = state.last_message() {
            if m.role == Role::Assistant && m.text.to_lowercase().contains("order number") {
                return StateUpdate::default();
            }
        }

        let last_user = match state.last_user_text() {
            Some(text) => text.to_string(),
            None => return StateUpdate::say(ASK_FIRST),
        };

        // 正则优先（大小写不敏感，归一化为大写）
        if let Some(m) = order_number_pattern().find(&last_user.to_uppercase()) {
            return Self::found(m.as_str().to_string());
        }

        // NLU 兜底抽取
        match self.nlu.complete(EXTRACTION_PROMPT, &last_user).await {
            Ok(reply) => {
                let extracted = reply.trim().to_uppercase();
                if extracted != "NONE" && extracted.len() >= 6 {
                    return Self::found(extracted);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "order number extraction via NLU failed");
            }
        }

        StateUpdate::say(ASK_AGAIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::state::Message;
    use crate::llm::ScriptedNlu;

    fn worker(replies: &[&str]) -> CollectOrderNumberWorker {
        CollectOrderNumberWorker::new(Arc::new(ScriptedNlu::new(replies.iter().copied())))
    }

    fn state_with(text: &str) -> ConversationState {
        let mut s = ConversationState::new("s-1", "en");
        s.messages.push(Message::user(text));
        s
    }

    #[tokio::test]
    async fn regex_extracts_compact_numbers() {
        let update = worker(&[]).run(&state_with("it's abc-123456 thanks")).await;
        match update.order_number {
            Patch::Set(n) => assert_eq!(n, "ABC-123456"),
            other => panic!("expected Set, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn regex_extracts_long_digit_runs() {
        let update = worker(&[]).run(&state_with("order 1234567890 please")).await;
        assert!(matches!(update.order_number, Patch::Set(n) if n == "1234567890"));
    }

    #[tokio::test]
    async fn nlu_fallback_handles_hyphenated_ids() {
        // ORD-2024-001 内嵌连字符，正则不命中，走 NLU
        let update = worker(&["ORD-2024-001"])
            .run(&state_with("my order is ORD-2024-001"))
            .await;
        assert!(matches!(update.order_number, Patch::Set(n) if n == "ORD-2024-001"));
    }

    #[tokio::test]
    async fn asks_when_nothing_found() {
        let update = worker(&["NONE"]).run(&state_with("I bought a thing")).await;
        assert!(matches!(update.order_number, Patch::Keep));
        assert!(update.messages[0].text.contains('?'));
    }

    #[tokio::test]
    async fn does_not_ask_twice_in_a_row() {
        let mut s = state_with("I bought a thing");
        s.messages.push(Message::assistant(ASK_AGAIN));
        let update = worker(&[]).run(&s).await;
        assert!(update.messages.is_empty());
        assert!(matches!(update.order_number, Patch::Keep));
    }

    #[tokio::test]
    async fn existing_number_is_a_noop() {
        let mut s = state_with("whatever");
        s.order_number = Some("ORD-2024-001".into());
        let update = worker(&[]).run(&s).await;
        assert!(update.messages.is_empty());
    }
}

//! 意图分类 Worker
//!
//! 只在意图未设置时调用 NLU（检查点恢复后不重分类）；输出限定在封闭集合内，
//! NLU 失败或输出越界一律兜底为 Other。

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::state::{ConversationState, Intent, Patch, StateUpdate};
use crate::agent::workers::Worker;
use crate::llm::NluClient;

const SYSTEM_PROMPT: &str = "You are a customer service intent classifier.
Your job is to determine if the user wants to:
- \"return\" (return a product/order)
- \"refund\" (get money back)
- \"order_status\" (check order status or tracking)
- \"other\" (something else)

Respond with ONLY ONE WORD: return, refund, order_status, or other.

Examples:
User: \"I want to return my order\" -> return
User: \"Can I get a refund?\" -> refund
User: \"I'd like my money back\" -> refund
User: \"Send this back\" -> return
User: \"Where is my order?\" -> order_status
User: \"What's the status of my order?\" -> order_status
User: \"Track my package\" -> order_status
User: \"Has my order shipped?\" -> order_status
User: \"What's your phone number?\" -> other";

pub struct ClassifyIntentWorker {
    nlu: Arc<dyn NluClient>,
}

impl ClassifyIntentWorker {
    pub fn new(nlu: Arc<dyn NluClient>) -> Self {
        Self { nlu }
    }
}

#[async_trait]
impl Worker for ClassifyIntentWorker {
    fn name(&self) -> &'static str {
        "classify_intent"
    }

    async fn run(&self, state: &ConversationState) -> StateUpdate {
        // 检查点恢复安全：已有意图则不动
        if let Some(existing) = state.intent {
            tracing::debug!(?existing, "intent already set, skipping classification");
            return StateUpdate::default();
        }

        let last_user = match state.last_user_text() {
            Some(text) => text.to_string(),
            None => {
                return StateUpdate {
                    intent: Patch::Set(Intent::Other),
                    ..Default::default()
                }
            }
        };

        let intent = match self.nlu.complete(SYSTEM_PROMPT, &last_user).await {
            Ok(reply) => Intent::parse(&reply).unwrap_or(Intent::Other),
            Err(e) => {
                // NLU 失败就地恢复：安全默认值，不置 error
                tracing::warn!(error = %e, "intent classification failed, falling back to other");
                Intent::Other
            }
        };

        tracing::info!(?intent, "classified user intent");
        StateUpdate {
            intent: Patch::Set(intent),
            ..Default::default()
        }
    }
}

//! 策略检查 Worker
//!
//! 薄封装：把订单投影交给纯策略引擎算资格。确定性计算本身不应失败，
//! 缺订单数据按 MISSING_INPUT 处理。

use async_trait::async_trait;
use chrono::Utc;

use crate::agent::policy::check_window;
use crate::agent::state::{ConversationState, Patch, StateUpdate};
use crate::agent::workers::Worker;

pub struct CheckPolicyWorker;

#[async_trait]
impl Worker for CheckPolicyWorker {
    fn name(&self) -> &'static str {
        "check_policy"
    }

    async fn run(&self, state: &ConversationState) -> StateUpdate {
        let order = match &state.order {
            Some(order) => order,
            None => {
                return StateUpdate::fail(
                    "NO_ORDER_DATA",
                    "no order data for policy check",
                    "I'm sorry, I couldn't check the policy without your order details. Could you share your order number again, please?",
                )
            }
        };

        let eligibility = check_window(order, Utc::now());
        tracing::info!(
            return_eligible = eligibility.is_return_eligible,
            refund_eligible = eligibility.is_refund_eligible,
            reason = %eligibility.reason,
            "policy window evaluated"
        );
        StateUpdate {
            eligibility: Patch::Set(eligibility),
            ..Default::default()
        }
    }
}

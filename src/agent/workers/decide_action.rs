//! 动作决策 Worker
//!
//! 两个窗口都不满足 → cancel；只满足一个 → 自动选中；都满足则看用户最近一条消息
//! 是否明确说了 return / refund，否则发问并留空（路由器靠问句启发式暂停）。

use async_trait::async_trait;

use crate::agent::policy::format_eligibility_message;
use crate::agent::state::{ConversationState, DesiredAction, Patch, StateUpdate};
use crate::agent::workers::{contains_token, Worker};

pub struct DecideActionWorker;

#[async_trait]
impl Worker for DecideActionWorker {
    fn name(&self) -> &'static str {
        "decide_action"
    }

    async fn run(&self, state: &ConversationState) -> StateUpdate {
        let eligibility = match &state.eligibility {
            Some(e) => e,
            None => {
                return StateUpdate::fail(
                    "NO_ELIGIBILITY_DATA",
                    "no eligibility computed before deciding action",
                    "I'm sorry, something went wrong while checking your order's options. Please try again.",
                )
            }
        };

        let summary = format_eligibility_message(eligibility);

        match (
            eligibility.is_return_eligible,
            eligibility.is_refund_eligible,
        ) {
            (false, false) => StateUpdate {
                desired_action: Patch::Set(DesiredAction::Cancel),
                ..Default::default()
            }
            .and_say(format!(
                "{} If you need further assistance, please contact our support team.",
                summary
            )),

            (true, false) => StateUpdate {
                desired_action: Patch::Set(DesiredAction::Return),
                ..Default::default()
            }
            .and_say(format!("{} I'll proceed with processing your return.", summary)),

            (false, true) => StateUpdate {
                desired_action: Patch::Set(DesiredAction::Refund),
                ..Default::default()
            }
            .and_say(format!("{} I'll proceed with processing your refund.", summary)),

            (true, true) => {
                // 都可行：优先看用户是否已明确表态
                let last_user = state.last_user_text().unwrap_or_default();
                let wants_return = contains_token(last_user, "return");
                let wants_refund = contains_token(last_user, "refund");

                if wants_return && !wants_refund {
                    StateUpdate {
                        desired_action: Patch::Set(DesiredAction::Return),
                        ..Default::default()
                    }
                    .and_say("Perfect! I'll process your return request.")
                } else if wants_refund && !wants_return {
                    StateUpdate {
                        desired_action: Patch::Set(DesiredAction::Refund),
                        ..Default::default()
                    }
                    .and_say("Perfect! I'll process your refund request.")
                } else {
                    StateUpdate::say(format!(
                        "{} Which would you like to proceed with? \
                         Please reply with **return** or **refund**.",
                        summary
                    ))
                }
            }
        }
    }
}

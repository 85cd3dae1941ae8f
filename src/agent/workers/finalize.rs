//! 收尾 Worker
//!
//! 工作流的唯一出口：输出结束语（成功路径含下一步指引与邮件备注），
//! 并无条件把 conversation_complete 置真。

use async_trait::async_trait;

use crate::agent::state::{ConversationState, DesiredAction, NotificationStatus, StateUpdate};
use crate::agent::workers::{mask_email, Worker};

const RETURN_STEPS: &str = "**Next steps:**\n\
     1. Package the item securely in its original packaging\n\
     2. Print the return label we'll email you\n\
     3. Drop off the package at any shipping location\n\
     4. Your refund will be processed within 3-5 business days of receipt";

const REFUND_STEPS: &str = "**Next steps:**\n\
     1. Your refund will be processed within 3-5 business days\n\
     2. The amount will be credited to your original payment method\n\
     3. You'll receive an email confirmation once processed";

pub struct FinalizeWorker;

impl FinalizeWorker {
    fn success_message(state: &ConversationState, action: DesiredAction) -> String {
        let ticket_id = state
            .action_ticket
            .as_ref()
            .and_then(|t| t.id.as_deref())
            .unwrap_or("(pending)");

        let email_note = match (&state.notification_status, &state.order) {
            (Some(NotificationStatus::Sent), Some(order)) => format!(
                " I've emailed {} with the details and next steps.",
                mask_email(&order.customer_email)
            ),
            (Some(NotificationStatus::Failed), _) => " Note: There was an issue sending the \
                 confirmation email, but your ticket has been created."
                .to_string(),
            _ => String::new(),
        };

        let steps = match action {
            DesiredAction::Refund => REFUND_STEPS,
            _ => RETURN_STEPS,
        };

        format!(
            "✅ All done! I've created a {} ticket {} for your order.{}\n\n{}",
            action.as_str(),
            ticket_id,
            email_note,
            steps
        )
    }
}

#[async_trait]
impl Worker for FinalizeWorker {
    fn name(&self) -> &'static str {
        "finalize"
    }

    async fn run(&self, state: &ConversationState) -> StateUpdate {
        let text = match state.desired_action {
            Some(DesiredAction::Cancel) => "Thank you for contacting us. If you have any other \
                 questions, feel free to reach out!"
                .to_string(),
            Some(action) => Self::success_message(state, action),
            None => match &state.eligibility {
                Some(e) if !e.any_eligible() => format!(
                    "I'm sorry, this order isn't eligible for return or refund. Reason: {}",
                    e.reason
                ),
                _ => "Thank you. We've completed the check on your order. If there's anything \
                      else you need, just let me know!"
                    .to_string(),
            },
        };

        StateUpdate {
            conversation_complete: Some(true),
            ..Default::default()
        }
        .and_say(text)
    }
}

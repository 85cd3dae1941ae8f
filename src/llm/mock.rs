//! Mock NLU 客户端（用于测试与离线开发，无需 API）
//!
//! MockNlu 用关键词规则近似分类 / 抽取；ScriptedNlu 按脚本顺序吐出预设回复，
//! 供集成测试精确控制每次 NLU 调用的结果。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::NluClient;

/// 关键词规则 Mock：无 API Key 时的默认后端
#[derive(Debug, Default)]
pub struct MockNlu;

#[async_trait]
impl NluClient for MockNlu {
    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<String, String> {
        let text = user_content.to_lowercase();

        // 意图分类提示：按关键词给出封闭集合中的一个词
        if system_prompt.contains("intent classifier") {
            let intent = if text.contains("refund") || text.contains("money back") {
                "refund"
            } else if text.contains("return") || text.contains("send") && text.contains("back") {
                "return"
            } else if text.contains("status") || text.contains("track") || text.contains("where") {
                "order_status"
            } else {
                "other"
            };
            return Ok(intent.to_string());
        }

        // 订单号抽取提示：规则抽不出就交给上游的 NONE 分支
        if system_prompt.contains("extract an order number") {
            return Ok("NONE".to_string());
        }

        Ok(format!("Echo from Mock: {}", user_content))
    }
}

/// 脚本化 Mock：按入队顺序返回回复，队列空时报错
#[derive(Debug, Default)]
pub struct ScriptedNlu {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedNlu {
    pub fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }

    pub fn push(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }
}

#[async_trait]
impl NluClient for ScriptedNlu {
    async fn complete(&self, _system_prompt: &str, _user_content: &str) -> Result<String, String> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| "scripted replies exhausted".to_string())
    }
}

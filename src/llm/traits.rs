//! NLU 能力抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 NluClient：单一 complete 操作，
//! 既用于封闭集合分类（调用方校验输出、兜底安全默认值），也用于开放式消息生成。

use async_trait::async_trait;

/// NLU 客户端 trait：给定系统提示与用户内容，返回模型文本
#[async_trait]
pub trait NluClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<String, String>;
}

//! 对话工作流引擎
//!
//! 分层：状态模型（state）是唯一共享数据结构；策略引擎（policy）与监督路由器
//! （supervisor）是纯函数；Worker（workers）承载各步骤的业务与副作用；
//! 编排循环（service）把三者串成可恢复的单轮处理。

pub mod error;
pub mod policy;
pub mod service;
pub mod state;
pub mod supervisor;
pub mod workers;

pub use error::AgentError;
pub use service::{AgentGraph, AgentService, TurnOutcome};
pub use state::ConversationState;

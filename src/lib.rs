//! Clerk - 客服对话工作流引擎
//!
//! 将一次退货 / 退款 / 订单状态查询的多轮客服会话建模为可恢复的工作流：
//! 会话状态依次流经单一职责的 Worker，监督路由器在每步之后决定下一步或暂停等待用户。
//!
//! 模块划分：
//! - **agent**: 状态模型、策略引擎、监督路由器、Worker、编排循环
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **llm**: NLU 能力抽象与实现（OpenAI 兼容 / Mock）
//! - **store**: 检查点 / 订单 / 工单台账的存储接口（SQLite 与内存实现）

pub mod agent;
pub mod config;
pub mod llm;
pub mod observability;
pub mod store;

pub use agent::{AgentGraph, AgentService, TurnOutcome};

//! 引擎级错误
//!
//! 状态内的用户可见错误走 `ErrorInfo`（暂停并等用户）；这里是对调用方致命的错误：
//! 检查点存储不可用，或单轮步数超限（路由 / Worker 循环未收敛）。

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("checkpoint store failure: {0}")]
    Checkpoint(#[from] StoreError),

    #[error("step limit exceeded: turn did not converge within {0} steps")]
    StepLimitExceeded(usize),
}

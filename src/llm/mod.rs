//! NLU 层：能力抽象与实现（OpenAI 兼容 / Mock）

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::{MockNlu, ScriptedNlu};
pub use openai::OpenAiNlu;
pub use traits::NluClient;

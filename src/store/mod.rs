//! 存储层：检查点 / 订单 / 工单台账（SQLite 与内存实现）

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    CheckpointStore, InsertOutcome, OrderRecord, OrderRecordItem, OrderStore, StoreError, Ticket,
    TicketLedger,
};

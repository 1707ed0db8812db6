//! Infrastructure layer: storage adapters and the workflows that run on them.

pub mod store;
pub mod workflow;


pub use store::{
    FailPoint, InMemoryStore, MemoryDataset, PgStore, Store, StoreError, StoreTx,
};
pub use workflow::{
    BackOffice, BackOfficeError, PurchaseAborted, PurchaseReceipt, PurchaseWorkflow,
    WorkflowError, WorkflowStage,
};

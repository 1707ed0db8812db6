//! Transactional storage boundary.
//!
//! Workflows never hold a global connection: they are handed a [`Store`] and
//! do all of a request's writes through one [`StoreTx`] scope.

pub mod in_memory;
pub mod postgres;
pub mod traits;
pub mod views;

pub use in_memory::{FailPoint, InMemoryStore, MemoryDataset};
pub use postgres::PgStore;
pub use traits::{Store, StoreError, StoreTx};
pub use views::{
    ExpenseView, FeriwalaRecordView, KabadiwalaOwnerEntry, KabadiwalaSummaryView,
    PurchaseLineView,
};

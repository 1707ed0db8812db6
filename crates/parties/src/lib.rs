//! Parties the godown deals with: scrap vendors and daily-wage labourers.
//!
//! Pure domain types only (no IO, no HTTP, no storage).

pub mod labourer;
pub mod vendor;

pub use labourer::Labourer;
pub use vendor::Vendor;

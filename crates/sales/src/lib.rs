//! Sales ("maal out"): processed scrap leaving the godown, and buyer payments.
//!
//! Pure domain logic only (no IO, no HTTP, no storage).

pub mod maal_out;

pub use maal_out::{NewSale, NewSalePayment, Sale, SalePayment};

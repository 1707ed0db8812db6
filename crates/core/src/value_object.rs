//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**: two instances holding the same values
/// are interchangeable. `Money`, `Weight`, `Rate` and `Scope` are value
/// objects; vendors, purchases and ledger entries are entities.
///
/// To "modify" a value object, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

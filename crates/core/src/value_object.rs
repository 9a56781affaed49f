//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** — a reference
/// month, a calculation result, a payment record. Two instances with the same
/// values are the same value; to "modify" one, build a new one.
///
/// The trait requires `Clone + PartialEq + Debug` so values copy cheaply,
/// compare by attributes and show up legibly in logs and test failures.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

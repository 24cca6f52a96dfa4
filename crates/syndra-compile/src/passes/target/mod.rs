//! Target-specific compilation passes.
//!
//! These passes reshape a circuit into the instruction forms a particular
//! kind of device executes natively.

pub mod translation;

pub use translation::ZBasisTranslation;

//! Domain model module declarations.

pub mod transaction;

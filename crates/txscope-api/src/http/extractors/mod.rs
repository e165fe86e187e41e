//! Request extractors.

pub mod unit_of_work;

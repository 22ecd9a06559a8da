//! Order lifecycle service

pub mod lifecycle;

pub use lifecycle::{OrderLifecycleService, OrderQuery, OrderStats};

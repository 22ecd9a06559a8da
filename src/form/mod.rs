//! Order form controller

pub mod controller;

pub use controller::{OrderFormController, OrderHeader};

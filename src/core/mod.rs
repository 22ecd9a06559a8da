//! Core module containing the domain model, the pure weight/aggregation core
//! and the traits at the store and auth boundaries

pub mod aggregate;
pub mod auth;
pub mod error;
pub mod extractors;
pub mod model;
pub mod session;
pub mod store;
pub mod validation;
pub mod weight;

pub use aggregate::{Aggregate, CatalogSnapshot, Selection, aggregate};
pub use auth::{AuthProvider, ConfigAuthProvider};
pub use error::{AppError, AppResult};
pub use extractors::{BearerToken, CurrentUser, SharedSessions};
pub use model::{
    Category, Material, MaterialScope, NewMaterial, NewOrder, Order, OrderDocument,
    OrderLineItem, OrderStatus, UserIdentity,
};
pub use session::{LoginSession, MemorySessionStore, SessionManager};
pub use store::{MaterialFilter, Store};
pub use weight::{format_weight, format_weight_full, format_weight_number, round4};

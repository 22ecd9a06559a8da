//! # material-order
//!
//! Construction-materials ordering: pick materials from a categorized
//! catalog, aggregate quantities into weighted order lines, and print the
//! result as a fixed-layout A4 order document.
//!
//! ## Features
//!
//! - **Weight Aggregation**: Per-line and total weights rounded to four decimals
//! - **Print Layout**: Category-grouped rows packed into columns and pages
//! - **Order Lifecycle**: Create, update, copy, delete and print, owner-only
//! - **Draft Materials**: Ad-hoc materials scoped to a single order
//! - **Session Auth**: Cookie or bearer tokens, resolved before any handler runs
//! - **Configuration-Based**: Server, session, users and layout from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use material_order::prelude::*;
//!
//! let config = AppConfig::load()?;
//! let store = InMemoryStore::new();
//! seed_catalog(&store).await?;
//!
//! ServerBuilder::new()
//!     .with_store(store)
//!     .with_auth(ConfigAuthProvider::new(&config.users))
//!     .with_sessions(config.session.clone())
//!     .with_layout(config.layout.clone())
//!     .serve(&config.server.bind)
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod form;
pub mod print;
pub mod server;
pub mod service;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        aggregate::{Aggregate, CatalogSnapshot, Selection, aggregate},
        auth::{AuthProvider, ConfigAuthProvider},
        error::{AppError, AppResult},
        extractors::{CurrentUser, SharedSessions},
        model::{
            Category, Material, MaterialScope, Order, OrderDocument, OrderLineItem, OrderStatus,
            UserIdentity,
        },
        session::{LoginSession, SessionManager},
        store::{MaterialFilter, Store},
        validation::{MaterialInput, OrderInput, OrderLineInput, ValidJson},
        weight::{format_weight, format_weight_full, round4},
    };

    // === Print ===
    pub use crate::print::{LayoutSettings, PrintOptions, plan_layout, render_printable};

    // === Form ===
    pub use crate::form::{OrderFormController, OrderHeader};

    // === Service ===
    pub use crate::service::{OrderLifecycleService, OrderQuery, OrderStats};

    // === Storage ===
    pub use crate::storage::{InMemoryStore, seed_catalog};

    // === Config ===
    pub use crate::config::AppConfig;

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder, build_router};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}

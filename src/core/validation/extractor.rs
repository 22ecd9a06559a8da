//! Axum extractor for validated JSON payloads

use crate::core::error::{AppError, ValidationError};
use crate::core::validation::input::{MaterialInput, OrderInput};
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

/// Payloads that know how to normalize and validate themselves
pub trait CheckedInput: Sized {
    fn check_input(self) -> Result<Self, ValidationError>;
}

impl CheckedInput for OrderInput {
    fn check_input(self) -> Result<Self, ValidationError> {
        self.check()
    }
}

impl CheckedInput for MaterialInput {
    fn check_input(self) -> Result<Self, ValidationError> {
        self.check()
    }
}

/// Axum extractor that deserializes and validates a JSON body
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_order(
///     user: CurrentUser,
///     ValidJson(input): ValidJson<OrderInput>,
/// ) -> AppResult<Json<Order>> {
///     // input is already trimmed and validated
/// }
/// ```
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + CheckedInput + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await.map_err(|e| {
            AppError::Validation(ValidationError::InvalidJson {
                message: e.body_text(),
            })
        })?;

        Ok(ValidJson(payload.check_input()?))
    }
}

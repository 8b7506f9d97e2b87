//! Classification of raw responses into success values or named errors.
//!
//! # Design
//! Any status in `200..=204` is a success. Below 500, any other status is a
//! client or business rejection: the body is decoded as an error envelope on
//! a best-effort basis (a malformed envelope just means "no message"), and
//! the operation's own status table decides which `DomainError` the caller
//! sees. Statuses the table does not list, and every status from 500 up,
//! become `UnknownResponse`.

use serde::de::DeserializeOwned;

use crate::error::{CrowdError, DomainError};
use crate::http::HttpResponse;
use crate::tables::lookup;
use crate::types::ErrorMessage;

/// Status codes an operation maps to named errors.
pub type StatusTable = [(u16, DomainError)];

/// What a response means for one operation.
#[derive(Debug)]
pub enum StatusOutcome {
    /// The call succeeded. Holds the (possibly empty) body.
    Success(Vec<u8>),
    Domain {
        error: DomainError,
        message: Option<String>,
    },
    Unknown(u16),
}

pub fn is_success(status: u16) -> bool {
    (200..=204).contains(&status)
}

pub fn classify(response: HttpResponse, table: &StatusTable) -> StatusOutcome {
    let status = response.status;
    if is_success(status) {
        return StatusOutcome::Success(response.body);
    }
    if status >= 500 {
        return StatusOutcome::Unknown(status);
    }

    let message = error_message(&response.body);
    match lookup(table, status) {
        Some(error) => {
            tracing::debug!(
                status,
                error = error.name(),
                message = message.as_deref().unwrap_or(""),
                "crowd rejected request"
            );
            StatusOutcome::Domain { error, message }
        }
        None => {
            tracing::debug!(
                status,
                message = message.as_deref().unwrap_or(""),
                "unmapped crowd response"
            );
            StatusOutcome::Unknown(status)
        }
    }
}

/// Classify a response for an operation that returns nothing on success.
pub fn expect_empty(response: HttpResponse, table: &StatusTable) -> Result<(), CrowdError> {
    into_body(classify(response, table)).map(|_| ())
}

/// Classify a response for an operation that returns a JSON value on success.
pub fn expect_json<T: DeserializeOwned>(
    response: HttpResponse,
    table: &StatusTable,
) -> Result<T, CrowdError> {
    let body = into_body(classify(response, table))?;
    serde_json::from_slice(&body).map_err(CrowdError::Deserialization)
}

fn into_body(outcome: StatusOutcome) -> Result<Vec<u8>, CrowdError> {
    match outcome {
        StatusOutcome::Success(body) => Ok(body),
        StatusOutcome::Domain { error, message } => Err(CrowdError::Domain { error, message }),
        StatusOutcome::Unknown(status) => Err(CrowdError::UnknownResponse(status)),
    }
}

/// Best-effort decode of the remote error envelope.
///
/// A body that is not a valid envelope yields `None`; it never fails the call.
// TODO: surface malformed envelopes as a local error if the remote ever
// guarantees the envelope on every 4xx.
fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorMessage>(body)
        .ok()
        .map(|envelope| envelope.message)
}

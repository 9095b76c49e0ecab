//! The error kinds of the engine, and the one place where any of
//! them is turned into an HTTP response.

use std::borrow::Cow;

use rouille::{Response, ResponseBody};

use crate::http_response_status_codes::HttpResponseStatusCode;
use crate::warn;

#[derive(Debug, thiserror::Error)]
pub enum GtmlError {
    #[error("route links must be records with path-encodable fields, \
             {shape} is not: {reason}")]
    InvalidLinkShape { shape: &'static str, reason: String },

    #[error("search criteria must be records with valid fields, \
             {shape} is not: {reason}")]
    InvalidCriteriaShape { shape: &'static str, reason: String },

    #[error("already registered: {0}")]
    DuplicateRegistration(String),

    #[error("no search registered for criteria type {0}")]
    UnregisteredCriteria(&'static str),

    #[error("table rows must be records or references to records, got {0}")]
    InvalidRowShape(String),

    #[error("{0} not found")]
    ResourceNotFound(String),

    #[error("decoding failure: {0}")]
    DecodeFailure(String),

    #[error("rendering failure: {0}")]
    RenderFailure(String),

    #[error("template {name:?}: {reason}")]
    TemplateFailure { name: String, reason: String },
}

impl GtmlError {
    /// The `GtmlError` anywhere in the chain of `err`, if any.
    pub fn find(err: &anyhow::Error) -> Option<&GtmlError> {
        err.chain().find_map(|e| e.downcast_ref::<GtmlError>())
    }
}

/// Convert any error that happened while handling a request into the
/// response sent to the client. Every failure maps to a 500 with a
/// plain-text body; domain-level "not found" is not distinguished
/// (yet).
pub fn error_response(err: &anyhow::Error) -> Response {
    let status = HttpResponseStatusCode::InternalServerError500;
    warn!("ERROR in request (return {status:?}): {err:#}");
    let body = format!("{} - ERROR: {err:#}", status.code());
    Response {
        status_code: status.code(),
        headers: vec![(Cow::from("Content-type"),
                       Cow::from("text/plain; charset=utf-8"))],
        data: ResponseBody::from_string(body),
        upgrade: None,
    }
}

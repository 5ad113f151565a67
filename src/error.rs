use std::time::Duration;

use log::{debug, error};
use mongodb::error::{Error as DbError, ErrorKind as DbErrorKind};
use rocket::{
    http::Status,
    response::{status, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{InconsistentBallot, VoteRejection};
use crate::model::api::poll::{ValidationError, Violation};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Rejected(#[from] VoteRejection),
    #[error(transparent)]
    Inconsistent(#[from] InconsistentBallot),
    #[error("Store did not respond within {0:?}")]
    StoreTimeout(Duration),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) => Status::BadRequest,
            Self::Rejected(VoteRejection::UnknownCandidate(_)) => Status::BadRequest,
            Self::Rejected(_) => Status::Conflict,
            Self::NotFound(_) => Status::NotFound,
            Self::Jwt(_) | Self::Unauthorized(_) => Status::Unauthorized,
            Self::Forbidden(_) => Status::Forbidden,
            Self::StoreTimeout(_) => Status::ServiceUnavailable,
            Self::Db(_) | Self::Inconsistent(_) => Status::InternalServerError,
        }
    }

    /// Short machine-readable name of this error, used as the `error` field
    /// of the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Db(_) => "database",
            Self::Jwt(_) | Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Validation(_) => "validation",
            Self::Rejected(VoteRejection::PollNotOngoing(_)) => "poll_not_ongoing",
            Self::Rejected(VoteRejection::UnknownCandidate(_)) => "unknown_candidate",
            Self::Rejected(VoteRejection::AlreadyVoted) => "already_voted",
            Self::Inconsistent(_) => "inconsistent",
            Self::StoreTimeout(_) => "store_timeout",
            Self::NotFound(_) => "not_found",
        }
    }

    /// Could retrying the same read plausibly succeed?
    pub fn is_transient(&self) -> bool {
        match self {
            Self::StoreTimeout(_) => true,
            Self::Db(err) => matches!(
                *err.kind,
                DbErrorKind::Io(_)
                    | DbErrorKind::ConnectionPoolCleared { .. }
                    | DbErrorKind::ServerSelection { .. }
            ),
            _ => false,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            error: err.kind().to_string(),
            message: err.to_string(),
            violations: match err {
                Error::Validation(validation) => Some(validation.violations.clone()),
                _ => None,
            },
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{} {}: {}", req.method(), req.uri(), self);
        } else {
            debug!("{} {}: {}", req.method(), req.uri(), self);
        }
        status::Custom(status, Json(ErrorBody::from(&self))).respond_to(req)
    }
}

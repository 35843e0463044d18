//! Error and result types.
//!
//! `ApiError` covers everything that can go wrong on a round trip to the user
//! service; `ValidationError` covers form input rejected before a request is
//! issued. The binary boundary reports everything else through `anyhow`.

use std::fmt::{Display, Formatter};

use reqwest::StatusCode;

/// Operations issued against the user service, used to label failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiOp {
    ListAll,
    FindById,
    FindByRole,
    Create,
    Update,
    DeleteById,
}

impl Display for ApiOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApiOp::ListAll => "list users",
            ApiOp::FindById => "find user by id",
            ApiOp::FindByRole => "find users by role",
            ApiOp::Create => "create user",
            ApiOp::Update => "update user",
            ApiOp::DeleteById => "delete user",
        };
        f.write_str(s)
    }
}

/// Failure of a single call to the user service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{what} not found (status {status})")]
    NotFound {
        op: ApiOp,
        what: String,
        status: StatusCode,
    },

    #[error("{op} rejected with status {status}")]
    Rejected { op: ApiOp, status: StatusCode },

    #[error("delete of user {id} failed with status {status}")]
    DeleteFailed { id: u64, status: StatusCode },

    #[error("{op}: request failed: {source}")]
    Transport {
        op: ApiOp,
        #[source]
        source: reqwest::Error,
    },

    #[error("{op}: malformed response: {source}")]
    Decode {
        op: ApiOp,
        #[source]
        source: reqwest::Error,
    },

    #[error("{op}: invalid endpoint {path}: {source}")]
    Endpoint {
        op: ApiOp,
        path: String,
        #[source]
        source: url::ParseError,
    },
}

impl ApiError {
    /// Short text for the notification shown to the user.
    ///
    /// Failures are told apart by the operation that raised them, not by
    /// status code or body.
    pub fn user_message(&self) -> &'static str {
        match self.op() {
            ApiOp::ListAll => "Failed to fetch users.",
            ApiOp::FindById => "Failed to find user.",
            ApiOp::FindByRole => "Failed to find users.",
            ApiOp::Create => "Failed to create user.",
            ApiOp::Update => "Failed to update user.",
            ApiOp::DeleteById => "Failed to delete user.",
        }
    }

    pub fn op(&self) -> ApiOp {
        match self {
            ApiError::NotFound { op, .. }
            | ApiError::Rejected { op, .. }
            | ApiError::Transport { op, .. }
            | ApiError::Decode { op, .. }
            | ApiError::Endpoint { op, .. } => *op,
            ApiError::DeleteFailed { .. } => ApiOp::DeleteById,
        }
    }
}

/// Form input rejected before any request is made.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter the {0}")]
    Required(&'static str),
    #[error("Please enter a valid email")]
    InvalidEmail,
    #[error("Please enter a valid positive number for ID.")]
    InvalidId,
    #[error("Please select a role")]
    MissingRole,
}

//! Response status vocabulary.
//!
//! Codes mirror HTTP semantics so that gateways can forward them verbatim.

use crate::errors::UnknownStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric status carried in every `ResponseEnvelope`.
///
/// The set is closed: anything else on the wire is rejected when a response
/// is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum Status {
    /// 200 - success
    Ok,
    /// 201 - resource created
    Created,
    /// 400 - bad, missing or duplicate input
    BadRequest,
    /// 401 - bad credentials or unresolvable token
    Unauthorized,
    /// 403 - authenticated but not allowed, or inactive account
    Forbidden,
    /// 404 - referenced entity absent
    NotFound,
    /// 500 - anything unanticipated
    InternalError,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::BadRequest => 400,
            Status::Unauthorized => 401,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::InternalError => 500,
        }
    }

    /// True for 2xx codes.
    pub const fn is_success(self) -> bool {
        matches!(self, Status::Ok | Status::Created)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<Status> for u16 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl TryFrom<u16> for Status {
    type Error = UnknownStatus;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            200 => Ok(Status::Ok),
            201 => Ok(Status::Created),
            400 => Ok(Status::BadRequest),
            401 => Ok(Status::Unauthorized),
            403 => Ok(Status::Forbidden),
            404 => Ok(Status::NotFound),
            500 => Ok(Status::InternalError),
            other => Err(UnknownStatus(other)),
        }
    }
}

/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Error types for weldflow.
//!
//! The error taxonomy follows the layers of the system:
//!
//! - [`DalError`]: connection-pool and query failures.
//! - [`WorkflowError`]: domain-level failures - missing entities, operations
//!   attempted against an entity in the wrong state, corrupted status values.
//!   State errors are ordinary values here, never panics; no state mutation
//!   has occurred when one is returned.
//! - [`HandlerError`]: a job handler's verdict on a payload. `Rejected`
//!   carries the human-readable validation/resolution error list.
//! - [`DispatchError`]: dispatcher-level failures outside any single job
//!   file (directory I/O, audit-log access).

use std::path::PathBuf;

use thiserror::Error;

use crate::workflow::status::UnknownStatusError;

/// Errors from the data access layer.
#[derive(Error, Debug)]
pub enum DalError {
    /// Failed to obtain a connection from the pool
    #[error("connection pool error: {0}")]
    Pool(String),

    /// A query or transaction failed
    #[error("database error: {0}")]
    Query(#[from] diesel::result::Error),
}

/// Domain-level errors from workflow operations.
///
/// Every variant describes a state in which no mutation has taken place:
/// transactions roll back before these are returned.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// No request exists with the given WCR number
    #[error("request {wcr_number} not found")]
    RequestNotFound { wcr_number: String },

    /// No coupon with the given number belongs to the request
    #[error("coupon {coupon_number} not found on request {wcr_number}")]
    CouponNotFound {
        wcr_number: String,
        coupon_number: i32,
    },

    /// The request is in a state that does not permit the operation
    #[error("cannot {operation} request {wcr_number} in status {status}")]
    InvalidRequestState {
        wcr_number: String,
        operation: &'static str,
        status: String,
    },

    /// The coupon is in a state that does not permit the operation
    #[error(
        "cannot {operation} coupon {coupon_number} of request {wcr_number} in status {status}"
    )]
    InvalidCouponState {
        wcr_number: String,
        coupon_number: i32,
        operation: &'static str,
        status: String,
    },

    /// Qualification numbers are built from the welder's stamp
    #[error("welder on request {wcr_number} has no stamp assigned")]
    MissingStamp { wcr_number: String },

    /// The configured retest chain cap would be exceeded
    #[error("request {wcr_number} already sits at retest depth {depth}, cap is {max_depth}")]
    RetestDepthExceeded {
        wcr_number: String,
        depth: u32,
        max_depth: u32,
    },

    /// A request draft must carry at least one coupon
    #[error("a request draft must contain at least one coupon")]
    EmptyDraft,

    /// A stored status column holds an unrecognized value
    #[error(transparent)]
    Status(#[from] UnknownStatusError),

    /// Underlying database failure
    #[error(transparent)]
    Dal(#[from] DalError),
}

impl From<diesel::result::Error> for WorkflowError {
    fn from(e: diesel::result::Error) -> Self {
        WorkflowError::Dal(DalError::Query(e))
    }
}

/// A job handler's failure verdict for a single payload.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The payload was structurally or semantically invalid; nothing was
    /// written. The list is human-readable, one message per problem.
    #[error("payload rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),

    /// A workflow operation failed after the payload was accepted. The
    /// enclosing transaction has rolled back.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// Dispatcher-level errors not attributable to a single job file's content.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Filesystem failure while scanning or moving job files
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Audit-log access failed
    #[error(transparent)]
    Dal(#[from] DalError),
}

/// Errors while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

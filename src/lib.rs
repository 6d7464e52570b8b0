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

//! # Weldflow
//!
//! Weldflow is the job-intake dispatcher and weld-certification workflow
//! engine behind the quality-management platform. It picks up typed job files
//! from an incoming directory, routes them to registered handlers with audit
//! logging and quarantine semantics, and drives the two-level state machine
//! of a Weld Certification Request (WCR) and its test coupons: approval,
//! result entry, status rollup, qualification (WPQ) issuance, and retest
//! scheduling.
//!
//! ## Architecture
//!
//! - [`dispatcher`]: directory scan loop, [`dispatcher::HandlerRegistry`],
//!   and the audit-logged file lifecycle (incoming -> processed/failed).
//! - [`intake`]: payload validation, welder resolution against an external
//!   directory, and the certification-request job handler.
//! - [`workflow`]: the pure state-machine core - status enums, the rollup
//!   rule deriving a request's status from its coupons, and number
//!   generation for WCRs and WPQs.
//! - [`dal`]: transactional data access; every state-changing operation is a
//!   single read-modify-write transaction that includes the rollup.
//! - [`database`]: SQLite connection pooling and schema management.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use weldflow::config::WeldflowConfig;
//! use weldflow::dal::DAL;
//! use weldflow::database::Database;
//! use weldflow::dispatcher::{HandlerRegistry, JobDispatcher};
//! use weldflow::intake::{CertificationRequestHandler, SqliteWelderDirectory};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WeldflowConfig::default();
//! let database = Database::new("weldflow.db", config.db_pool_size)?;
//! let dal = Arc::new(DAL::new(database.clone()));
//! let welders = Arc::new(SqliteWelderDirectory::new(database));
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register(Arc::new(CertificationRequestHandler::new(
//!     dal.clone(),
//!     welders.clone(),
//!     welders,
//!     config.clone(),
//! )))?;
//!
//! let dispatcher = JobDispatcher::new(dal, Arc::new(registry), &config);
//! let summary = dispatcher.process_all()?;
//! println!("processed {} job files", summary.scanned);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dal;
pub mod database;
pub mod dispatcher;
pub mod error;
pub mod intake;
pub mod models;
pub mod workflow;

pub use config::WeldflowConfig;
pub use dal::DAL;
pub use database::Database;
pub use dispatcher::{HandlerRegistry, JobDispatcher, JobHandler};
pub use error::{DalError, DispatchError, HandlerError, WorkflowError};
pub use workflow::status::{CouponStatus, RequestStatus, TestResult};

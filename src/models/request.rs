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

//! Weld Certification Request Model
//!
//! A WCR represents one welder's submission for one or more procedure tests.
//! Rows are created once per submission and mutated only through the defined
//! transitions (approval, rollup, cancellation); terminal states are status
//! values, never deletions.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::Serialize;

/// A weld certification request row.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::database::schema::weld_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WeldRequest {
    /// Unique identifier for the request
    pub id: i32,
    /// Generated number, unique and monotonic per calendar year
    pub wcr_number: String,
    /// Welder registry identifier, when resolved
    pub welder_id: Option<i32>,
    /// Employee number the submission carried
    pub employee_number: Option<String>,
    /// Welder display name
    pub welder_name: String,
    /// Welder's identifying stamp
    pub welder_stamp: Option<String>,
    /// Project reference
    pub project: Option<String>,
    /// Date the request was raised
    pub request_date: Option<NaiveDate>,
    /// Who submitted the request
    pub submitted_by: Option<String>,
    /// Job file the request originated from
    pub source_file: Option<String>,
    /// Current request status (see `workflow::status::RequestStatus`)
    pub status: String,
    /// Whether the submission flagged a welder not yet in the registry
    pub is_new_welder: bool,
    /// Free-text notes
    pub notes: Option<String>,
    /// Approver recorded by the approval transition
    pub approved_by: Option<String>,
    /// When approval happened
    pub approved_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A new weld certification request.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::database::schema::weld_requests)]
pub struct NewWeldRequest {
    pub wcr_number: String,
    pub welder_id: Option<i32>,
    pub employee_number: Option<String>,
    pub welder_name: String,
    pub welder_stamp: Option<String>,
    pub project: Option<String>,
    pub request_date: Option<NaiveDate>,
    pub submitted_by: Option<String>,
    pub source_file: Option<String>,
    pub status: String,
    pub is_new_welder: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

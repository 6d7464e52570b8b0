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

//! Welder Performance Qualification Model
//!
//! A WPQ is the credential derived from exactly one passed coupon. The
//! procedure/process attributes are copied from the coupon at issuance.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::Serialize;

/// A welder performance qualification row.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::database::schema::qualifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Qualification {
    pub id: i32,
    /// Collision-avoided qualification number
    pub wpq_number: String,
    pub welder_id: Option<i32>,
    pub welder_stamp: String,
    pub procedure_ref: Option<String>,
    pub process: String,
    /// Positions the qualification covers
    pub positions: Option<String>,
    pub test_date: NaiveDate,
    pub initial_expiration: NaiveDate,
    pub current_expiration: NaiveDate,
    pub status: String,
    /// Notes referencing the origin coupon
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A new qualification row.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::database::schema::qualifications)]
pub struct NewQualification {
    pub wpq_number: String,
    pub welder_id: Option<i32>,
    pub welder_stamp: String,
    pub procedure_ref: Option<String>,
    pub process: String,
    pub positions: Option<String>,
    pub test_date: NaiveDate,
    pub initial_expiration: NaiveDate,
    pub current_expiration: NaiveDate,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

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

//! Coupon Model
//!
//! A coupon is a single test specimen/procedure combination within a WCR.
//! Welding parameters are fixed at creation; the outcome fields mutate once
//! via result entry. `wpq_id` and `retest_wcr_id` are one-way forward
//! references: a coupon owns at most one qualification and triggers at most
//! one retest request over its lifetime.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::Serialize;

/// A test coupon row.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::database::schema::coupons)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Coupon {
    pub id: i32,
    pub request_id: i32,
    /// Dense 1-based position within the request
    pub coupon_number: i32,
    /// Welding process (SMAW, GTAW, ...)
    pub process: String,
    pub position: Option<String>,
    pub procedure_ref: Option<String>,
    pub base_material: Option<String>,
    pub filler_metal: Option<String>,
    pub thickness: Option<String>,
    pub diameter: Option<String>,
    /// Recorded test outcome: `pass` or `fail`
    pub result: Option<String>,
    /// Current coupon status (see `workflow::status::CouponStatus`)
    pub status: String,
    pub tested_at: Option<NaiveDate>,
    pub tested_by: Option<String>,
    pub visual_result: Option<String>,
    pub bend_result: Option<String>,
    pub radiograph_result: Option<String>,
    pub failure_reason: Option<String>,
    /// Qualification record issued from this coupon, once passed
    pub wpq_id: Option<i32>,
    /// Request created to retest this coupon, once failed
    pub retest_wcr_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A new coupon row.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::database::schema::coupons)]
pub struct NewCoupon {
    pub request_id: i32,
    pub coupon_number: i32,
    pub process: String,
    pub position: Option<String>,
    pub procedure_ref: Option<String>,
    pub base_material: Option<String>,
    pub filler_metal: Option<String>,
    pub thickness: Option<String>,
    pub diameter: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

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

//! Coupon DAL: test result entry.
//!
//! Result entry is the transition `pending|testing -> passed|failed`. The
//! outcome write and the parent-status rollup happen in one transaction.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use tracing::info;

use super::{apply_rollup, coupon_status, find_coupon, find_request, request_status, DAL};
use crate::database::schema::coupons;
use crate::error::WorkflowError;
use crate::workflow::status::{CouponStatus, RequestStatus, TestResult};

/// Outcome fields for one coupon test.
#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub result: TestResult,
    pub tested_by: Option<String>,
    /// Defaults to today when absent
    pub tested_at: Option<NaiveDate>,
    pub visual_result: Option<String>,
    pub bend_result: Option<String>,
    pub radiograph_result: Option<String>,
    pub failure_reason: Option<String>,
}

impl ResultEntry {
    /// A minimal entry carrying just the verdict.
    pub fn of(result: TestResult) -> Self {
        Self {
            result,
            tested_by: None,
            tested_at: None,
            visual_result: None,
            bend_result: None,
            radiograph_result: None,
            failure_reason: None,
        }
    }
}

/// New statuses after a result entry.
#[derive(Debug, Clone, Copy)]
pub struct ResultRecorded {
    pub coupon_status: CouponStatus,
    pub request_status: RequestStatus,
}

/// Data access for test coupons.
#[derive(Clone)]
pub struct CouponDAL<'a> {
    dal: &'a DAL,
}

impl<'a> CouponDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Records a test result for one coupon and rolls the parent status up.
    ///
    /// Guards: the request must be in `approved`, `testing`, or
    /// `results_received`; the coupon must still be `pending` or `testing`.
    pub fn enter_result(
        &self,
        wcr_number: &str,
        coupon_number: i32,
        entry: ResultEntry,
    ) -> Result<ResultRecorded, WorkflowError> {
        let mut conn = self.dal.database().conn()?;
        let recorded = conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
            let request = find_request(conn, wcr_number)?;
            let current = request_status(&request)?;
            if !current.accepts_results() {
                return Err(WorkflowError::InvalidRequestState {
                    wcr_number: wcr_number.to_string(),
                    operation: "enter results for",
                    status: request.status,
                });
            }

            let coupon = find_coupon(conn, &request, coupon_number)?;
            if !coupon_status(&coupon)?.awaiting_result() {
                return Err(WorkflowError::InvalidCouponState {
                    wcr_number: wcr_number.to_string(),
                    coupon_number,
                    operation: "enter a result for",
                    status: coupon.status,
                });
            }

            let new_status = entry.result.coupon_status();
            let tested_at = entry
                .tested_at
                .unwrap_or_else(|| Utc::now().date_naive());
            diesel::update(coupons::table.find(coupon.id))
                .set((
                    coupons::result.eq(Some(entry.result.as_str().to_string())),
                    coupons::status.eq(new_status.as_str()),
                    coupons::tested_at.eq(Some(tested_at)),
                    coupons::tested_by.eq(entry.tested_by.clone()),
                    coupons::visual_result.eq(entry.visual_result.clone()),
                    coupons::bend_result.eq(entry.bend_result.clone()),
                    coupons::radiograph_result.eq(entry.radiograph_result.clone()),
                    coupons::failure_reason.eq(entry.failure_reason.clone()),
                    coupons::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;

            let request_status = apply_rollup(conn, request.id, current)?;
            Ok(ResultRecorded {
                coupon_status: new_status,
                request_status,
            })
        })?;

        info!(
            wcr_number,
            coupon_number,
            result = entry.result.as_str(),
            request_status = %recorded.request_status,
            "Coupon result recorded"
        );
        Ok(recorded)
    }
}

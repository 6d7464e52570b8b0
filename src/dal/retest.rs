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

//! Retest DAL: turning a failed coupon into a fresh, linked request.
//!
//! The new request starts its own lifecycle at `pending_approval` with one
//! coupon copied from the failed coupon's fixed parameters. The original
//! request's rollup generally keeps it at `results_received`; a request with
//! a failed coupon never reaches `completed`, even after a successful
//! retest on the new request.

use chrono::Utc;
use diesel::prelude::*;
use tracing::info;

use super::requests::next_number;
use super::{apply_rollup, coupon_status, find_coupon, find_request, request_status, DAL};
use crate::database::schema::{coupons, weld_requests};
use crate::error::WorkflowError;
use crate::models::{NewCoupon, NewWeldRequest};
use crate::workflow::status::{CouponStatus, RequestStatus};

/// Result of scheduling a retest.
#[derive(Debug, Clone)]
pub struct ScheduledRetest {
    pub retest_request_id: i32,
    pub retest_wcr_number: String,
    pub original_request_status: RequestStatus,
}

/// Data access for retest scheduling.
#[derive(Clone)]
pub struct RetestDAL<'a> {
    dal: &'a DAL,
}

impl<'a> RetestDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Schedules a retest for a failed coupon.
    ///
    /// The coupon must be exactly `failed`. In one transaction: create a new
    /// request (fresh number, same welder/project metadata, origin note)
    /// with a single pending coupon copied from the failed one, link the
    /// original coupon (`retest_wcr_id`, status `retest_scheduled`), and
    /// roll the original request's status up.
    ///
    /// When `max_depth` is set, the retest chain ending at this request may
    /// not grow past it.
    pub fn schedule_retest(
        &self,
        wcr_number: &str,
        coupon_number: i32,
        wcr_prefix: &str,
        max_depth: Option<u32>,
    ) -> Result<ScheduledRetest, WorkflowError> {
        let mut conn = self.dal.database().conn()?;
        let scheduled = conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
            let request = find_request(conn, wcr_number)?;
            let current = request_status(&request)?;
            let coupon = find_coupon(conn, &request, coupon_number)?;
            if coupon_status(&coupon)? != CouponStatus::Failed {
                return Err(WorkflowError::InvalidCouponState {
                    wcr_number: wcr_number.to_string(),
                    coupon_number,
                    operation: "schedule a retest for",
                    status: coupon.status,
                });
            }

            if let Some(max_depth) = max_depth {
                let depth = chain_depth(conn, request.id)?;
                if depth >= max_depth {
                    return Err(WorkflowError::RetestDepthExceeded {
                        wcr_number: wcr_number.to_string(),
                        depth,
                        max_depth,
                    });
                }
            }

            let now = Utc::now().naive_utc();
            let year = chrono::Datelike::year(&Utc::now());
            let retest_number = next_number(conn, wcr_prefix, year)?;

            let retest_request = NewWeldRequest {
                wcr_number: retest_number.clone(),
                welder_id: request.welder_id,
                employee_number: request.employee_number.clone(),
                welder_name: request.welder_name.clone(),
                welder_stamp: request.welder_stamp.clone(),
                project: request.project.clone(),
                request_date: Some(Utc::now().date_naive()),
                submitted_by: request.submitted_by.clone(),
                source_file: None,
                status: RequestStatus::PendingApproval.as_str().to_string(),
                is_new_welder: false,
                notes: Some(format!(
                    "Retest of coupon {} from {}",
                    coupon_number, wcr_number
                )),
                created_at: now,
                updated_at: now,
            };
            let retest_request_id: i32 = diesel::insert_into(weld_requests::table)
                .values(&retest_request)
                .returning(weld_requests::id)
                .get_result(conn)?;

            let retest_coupon = NewCoupon {
                request_id: retest_request_id,
                coupon_number: 1,
                process: coupon.process.clone(),
                position: coupon.position.clone(),
                procedure_ref: coupon.procedure_ref.clone(),
                base_material: coupon.base_material.clone(),
                filler_metal: coupon.filler_metal.clone(),
                thickness: coupon.thickness.clone(),
                diameter: coupon.diameter.clone(),
                status: CouponStatus::Pending.as_str().to_string(),
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(coupons::table)
                .values(&retest_coupon)
                .execute(conn)?;

            diesel::update(coupons::table.find(coupon.id))
                .set((
                    coupons::retest_wcr_id.eq(Some(retest_request_id)),
                    coupons::status.eq(CouponStatus::RetestScheduled.as_str()),
                    coupons::updated_at.eq(now),
                ))
                .execute(conn)?;

            let original_request_status = apply_rollup(conn, request.id, current)?;
            Ok(ScheduledRetest {
                retest_request_id,
                retest_wcr_number: retest_number,
                original_request_status,
            })
        })?;

        info!(
            wcr_number,
            coupon_number,
            retest_wcr_number = %scheduled.retest_wcr_number,
            "Retest scheduled"
        );
        Ok(scheduled)
    }
}

/// Number of retest links in the chain ending at `request_id`: 0 for an
/// original submission, 1 for its retest, and so on. Walks the
/// `retest_wcr_id` back-references.
fn chain_depth(
    conn: &mut diesel::sqlite::SqliteConnection,
    request_id: i32,
) -> Result<u32, WorkflowError> {
    let mut depth = 0;
    let mut current = request_id;
    loop {
        let parent: Option<i32> = coupons::table
            .filter(coupons::retest_wcr_id.eq(current))
            .select(coupons::request_id)
            .first(conn)
            .optional()?;
        match parent {
            Some(parent_id) => {
                depth += 1;
                current = parent_id;
            }
            None => return Ok(depth),
        }
    }
}

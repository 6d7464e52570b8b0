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

//! Qualification DAL: turning a passed coupon into a WPQ record.
//!
//! Expiration is computed as `months * 30` calendar days past the test
//! date. That is the inherited business rule, not true calendar-month
//! arithmetic; see DESIGN.md before "fixing" it.

use chrono::{Duration, Utc};
use diesel::prelude::*;
use tracing::info;

use super::{apply_rollup, coupon_status, find_coupon, find_request, request_status, DAL};
use crate::database::schema::{coupons, qualifications};
use crate::error::WorkflowError;
use crate::models::{NewQualification, Qualification};
use crate::workflow::numbering::{wpq_base_number, wpq_candidate};
use crate::workflow::status::{CouponStatus, RequestStatus};

/// Result of issuing a qualification.
#[derive(Debug, Clone)]
pub struct IssuedQualification {
    pub qualification_id: i32,
    pub wpq_number: String,
    pub expires_on: chrono::NaiveDate,
    pub request_status: RequestStatus,
}

/// Data access for welder performance qualifications.
#[derive(Clone)]
pub struct QualificationDAL<'a> {
    dal: &'a DAL,
}

impl<'a> QualificationDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Issues a qualification from a passed coupon.
    ///
    /// The coupon must be exactly `passed`. In one transaction: pick a
    /// collision-free WPQ number, insert the qualification, link the coupon
    /// (`wpq_id`, status `wpq_assigned`), and roll the parent status up.
    pub fn issue_from_coupon(
        &self,
        wcr_number: &str,
        coupon_number: i32,
        expiration_months: u32,
    ) -> Result<IssuedQualification, WorkflowError> {
        let mut conn = self.dal.database().conn()?;
        let issued = conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
            let request = find_request(conn, wcr_number)?;
            let current = request_status(&request)?;
            let coupon = find_coupon(conn, &request, coupon_number)?;
            if coupon_status(&coupon)? != CouponStatus::Passed {
                return Err(WorkflowError::InvalidCouponState {
                    wcr_number: wcr_number.to_string(),
                    coupon_number,
                    operation: "issue a qualification from",
                    status: coupon.status,
                });
            }

            let stamp = request
                .welder_stamp
                .clone()
                .ok_or_else(|| WorkflowError::MissingStamp {
                    wcr_number: wcr_number.to_string(),
                })?;

            let base = wpq_base_number(
                &stamp,
                coupon.procedure_ref.as_deref(),
                wcr_number,
                coupon_number,
                &coupon.process,
            );
            let wpq_number = unique_wpq_number(conn, &base)?;

            let test_date = coupon.tested_at.unwrap_or_else(|| Utc::now().date_naive());
            let expires_on = test_date + Duration::days(i64::from(expiration_months) * 30);

            let now = Utc::now().naive_utc();
            let qualification = NewQualification {
                wpq_number: wpq_number.clone(),
                welder_id: request.welder_id,
                welder_stamp: stamp,
                procedure_ref: coupon.procedure_ref.clone(),
                process: coupon.process.clone(),
                positions: coupon.position.clone(),
                test_date,
                initial_expiration: expires_on,
                current_expiration: expires_on,
                status: "active".to_string(),
                notes: Some(format!(
                    "Issued from coupon {} of {}",
                    coupon_number, wcr_number
                )),
                created_at: now,
                updated_at: now,
            };
            let qualification_id: i32 = diesel::insert_into(qualifications::table)
                .values(&qualification)
                .returning(qualifications::id)
                .get_result(conn)?;

            diesel::update(coupons::table.find(coupon.id))
                .set((
                    coupons::wpq_id.eq(Some(qualification_id)),
                    coupons::status.eq(CouponStatus::WpqAssigned.as_str()),
                    coupons::updated_at.eq(now),
                ))
                .execute(conn)?;

            let request_status = apply_rollup(conn, request.id, current)?;
            Ok(IssuedQualification {
                qualification_id,
                wpq_number,
                expires_on,
                request_status,
            })
        })?;

        info!(
            wcr_number,
            coupon_number,
            wpq_number = %issued.wpq_number,
            "Qualification issued"
        );
        Ok(issued)
    }

    /// Fetches a qualification by its number.
    pub fn find_by_number(
        &self,
        wpq_number: &str,
    ) -> Result<Option<Qualification>, WorkflowError> {
        let mut conn = self.dal.database().conn()?;
        let qualification = qualifications::table
            .filter(qualifications::wpq_number.eq(wpq_number))
            .select(Qualification::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(qualification)
    }

    /// Lists a welder's qualifications by stamp, newest first.
    pub fn list_for_stamp(&self, stamp: &str) -> Result<Vec<Qualification>, WorkflowError> {
        let mut conn = self.dal.database().conn()?;
        let records = qualifications::table
            .filter(qualifications::welder_stamp.eq(stamp))
            .order(qualifications::created_at.desc())
            .select(Qualification::as_select())
            .load(&mut conn)?;
        Ok(records)
    }
}

/// Finds the first free candidate in the deterministic suffix series
/// `base`, `base-2`, `base-3`, ...
fn unique_wpq_number(
    conn: &mut diesel::sqlite::SqliteConnection,
    base: &str,
) -> Result<String, WorkflowError> {
    use diesel::dsl::count_star;

    for attempt in 1.. {
        let candidate = wpq_candidate(base, attempt);
        let taken: i64 = qualifications::table
            .filter(qualifications::wpq_number.eq(&candidate))
            .select(count_star())
            .first(conn)?;
        if taken == 0 {
            return Ok(candidate);
        }
    }
    unreachable!("suffix series is unbounded")
}

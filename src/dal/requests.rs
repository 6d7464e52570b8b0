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

//! Request DAL: creation, approval, cancellation, and the query surface.

use chrono::{Datelike, NaiveDate, Utc};
use diesel::prelude::*;
use tracing::info;

use super::{apply_rollup, find_request, request_status, DAL};
use crate::database::schema::{coupons, weld_requests};
use crate::error::WorkflowError;
use crate::models::{Coupon, NewCoupon, NewWeldRequest, WeldRequest};
use crate::workflow::numbering;
use crate::workflow::status::{CouponStatus, RequestStatus};

/// Everything needed to create a request; produced by the intake pipeline
/// after validation and welder resolution.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub welder_id: Option<i32>,
    pub employee_number: Option<String>,
    pub welder_name: String,
    pub welder_stamp: Option<String>,
    pub project: Option<String>,
    pub request_date: Option<NaiveDate>,
    pub submitted_by: Option<String>,
    pub source_file: Option<String>,
    pub is_new_welder: bool,
    pub notes: Option<String>,
    pub coupons: Vec<CouponDraft>,
}

/// Welding parameters for one coupon, fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct CouponDraft {
    pub process: String,
    pub position: Option<String>,
    pub procedure_ref: Option<String>,
    pub base_material: Option<String>,
    pub filler_metal: Option<String>,
    pub thickness: Option<String>,
    pub diameter: Option<String>,
}

/// Result of creating a request.
#[derive(Debug, Clone)]
pub struct CreatedRequest {
    pub request_id: i32,
    pub wcr_number: String,
    pub coupon_count: usize,
}

/// Filters for the request list query. Empty filter lists everything.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub project: Option<String>,
    /// Case-sensitive substring match on the welder display name
    pub welder_contains: Option<String>,
}

/// Data access for weld certification requests.
#[derive(Clone)]
pub struct RequestDAL<'a> {
    dal: &'a DAL,
}

impl<'a> RequestDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Creates a request and its coupons in one transaction.
    ///
    /// The WCR number is generated inside the same transaction that inserts
    /// the row, so sequences stay strictly increasing even with concurrent
    /// writers: BEGIN IMMEDIATE serializes them.
    pub fn create_with_coupons(
        &self,
        draft: RequestDraft,
        wcr_prefix: &str,
    ) -> Result<CreatedRequest, WorkflowError> {
        if draft.coupons.is_empty() {
            return Err(WorkflowError::EmptyDraft);
        }

        let mut conn = self.dal.database().conn()?;
        let created = conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
            let now = Utc::now().naive_utc();
            let year = Utc::now().year();
            let wcr_number = next_number(conn, wcr_prefix, year)?;

            let request = NewWeldRequest {
                wcr_number: wcr_number.clone(),
                welder_id: draft.welder_id,
                employee_number: draft.employee_number.clone(),
                welder_name: draft.welder_name.clone(),
                welder_stamp: draft.welder_stamp.clone(),
                project: draft.project.clone(),
                request_date: draft.request_date,
                submitted_by: draft.submitted_by.clone(),
                source_file: draft.source_file.clone(),
                status: RequestStatus::PendingApproval.as_str().to_string(),
                is_new_welder: draft.is_new_welder,
                notes: draft.notes.clone(),
                created_at: now,
                updated_at: now,
            };
            let request_id: i32 = diesel::insert_into(weld_requests::table)
                .values(&request)
                .returning(weld_requests::id)
                .get_result(conn)?;

            for (index, coupon) in draft.coupons.iter().enumerate() {
                let row = NewCoupon {
                    request_id,
                    coupon_number: index as i32 + 1,
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
                diesel::insert_into(coupons::table).values(&row).execute(conn)?;
            }

            Ok(CreatedRequest {
                request_id,
                wcr_number,
                coupon_count: draft.coupons.len(),
            })
        })?;

        info!(
            wcr_number = %created.wcr_number,
            coupons = created.coupon_count,
            "Certification request created"
        );
        Ok(created)
    }

    /// Approves a request awaiting approval.
    ///
    /// Any status other than `pending_approval` is an error, not a no-op.
    pub fn approve(&self, wcr_number: &str, approver: &str) -> Result<WeldRequest, WorkflowError> {
        let mut conn = self.dal.database().conn()?;
        let approved = conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
            let request = find_request(conn, wcr_number)?;
            let current = request_status(&request)?;
            if current != RequestStatus::PendingApproval {
                return Err(WorkflowError::InvalidRequestState {
                    wcr_number: wcr_number.to_string(),
                    operation: "approve",
                    status: request.status,
                });
            }

            let now = Utc::now().naive_utc();
            diesel::update(weld_requests::table.find(request.id))
                .set((
                    weld_requests::status.eq(RequestStatus::Approved.as_str()),
                    weld_requests::approved_by.eq(Some(approver.to_string())),
                    weld_requests::approved_at.eq(Some(now)),
                    weld_requests::updated_at.eq(now),
                ))
                .execute(conn)?;

            find_request(conn, wcr_number)
        })?;

        info!(wcr_number, approver, "Request approved");
        Ok(approved)
    }

    /// Cancels a request. Valid from any non-terminal state.
    pub fn cancel(&self, wcr_number: &str) -> Result<WeldRequest, WorkflowError> {
        let mut conn = self.dal.database().conn()?;
        let cancelled = conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
            let request = find_request(conn, wcr_number)?;
            let current = request_status(&request)?;
            if current.is_terminal() {
                return Err(WorkflowError::InvalidRequestState {
                    wcr_number: wcr_number.to_string(),
                    operation: "cancel",
                    status: request.status,
                });
            }

            diesel::update(weld_requests::table.find(request.id))
                .set((
                    weld_requests::status.eq(RequestStatus::Cancelled.as_str()),
                    weld_requests::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;

            find_request(conn, wcr_number)
        })?;

        info!(wcr_number, "Request cancelled");
        Ok(cancelled)
    }

    /// Re-runs the rollup for a request. The defined transitions already
    /// roll up inside their own transactions; this exists for repair after
    /// manual data surgery.
    pub fn recompute_status(&self, wcr_number: &str) -> Result<RequestStatus, WorkflowError> {
        let mut conn = self.dal.database().conn()?;
        conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
            let request = find_request(conn, wcr_number)?;
            let current = request_status(&request)?;
            apply_rollup(conn, request.id, current)
        })
    }

    /// Lists requests matching the filter, newest first.
    pub fn list(&self, filter: &RequestFilter) -> Result<Vec<WeldRequest>, WorkflowError> {
        let mut conn = self.dal.database().conn()?;
        let mut query = weld_requests::table.into_boxed();

        if let Some(status) = filter.status {
            query = query.filter(weld_requests::status.eq(status.as_str()));
        }
        if let Some(ref project) = filter.project {
            query = query.filter(weld_requests::project.eq(project.clone()));
        }
        if let Some(ref fragment) = filter.welder_contains {
            query = query.filter(weld_requests::welder_name.like(format!("%{}%", fragment)));
        }

        let requests = query
            .order(weld_requests::created_at.desc())
            .select(WeldRequest::as_select())
            .load(&mut conn)?;
        Ok(requests)
    }

    /// Fetches one request with its coupons in coupon-number order.
    pub fn get_with_coupons(
        &self,
        wcr_number: &str,
    ) -> Result<Option<(WeldRequest, Vec<Coupon>)>, WorkflowError> {
        let mut conn = self.dal.database().conn()?;
        let request = weld_requests::table
            .filter(weld_requests::wcr_number.eq(wcr_number))
            .select(WeldRequest::as_select())
            .first(&mut conn)
            .optional()?;

        match request {
            None => Ok(None),
            Some(request) => {
                let request_coupons = coupons::table
                    .filter(coupons::request_id.eq(request.id))
                    .order(coupons::coupon_number.asc())
                    .select(Coupon::as_select())
                    .load(&mut conn)?;
                Ok(Some((request, request_coupons)))
            }
        }
    }
}

/// Computes the next WCR number for `(prefix, year)` from the
/// lexicographically greatest existing number in that series.
pub(crate) fn next_number(
    conn: &mut diesel::sqlite::SqliteConnection,
    prefix: &str,
    year: i32,
) -> Result<String, WorkflowError> {
    let latest: Option<String> = weld_requests::table
        .filter(weld_requests::wcr_number.like(format!("{}-{}-%", prefix, year)))
        .select(weld_requests::wcr_number)
        .order(weld_requests::wcr_number.desc())
        .first(conn)
        .optional()?;
    Ok(numbering::next_wcr_number(latest.as_deref(), prefix, year))
}

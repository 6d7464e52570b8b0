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

//! Data Access Layer
//!
//! [`DAL`] is the root handle; per-aggregate sub-DALs hang off it:
//!
//! - [`ProcessingLogDAL`]: the dispatcher's append-only audit log.
//! - [`RequestDAL`]: request creation, approval, cancellation, queries.
//! - [`CouponDAL`]: result entry.
//! - [`QualificationDAL`]: WPQ issuance from passed coupons.
//! - [`RetestDAL`]: retest request scheduling from failed coupons.
//!
//! Every state-changing operation runs its read-modify-write (guards,
//! mutation, rollup recomputation) inside one `immediate_transaction`, so a
//! concurrent writer can never observe or produce a half-applied transition
//! or a stale rollup.

pub mod coupons;
pub mod processing_log;
pub mod qualifications;
pub mod requests;
pub mod retest;

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::database::schema::{coupons as coupons_table, weld_requests};
use crate::database::Database;
use crate::error::WorkflowError;
use crate::models::{Coupon, WeldRequest};
use crate::workflow::status::{self, CouponStatus, RequestStatus};

pub use coupons::{CouponDAL, ResultEntry, ResultRecorded};
pub use processing_log::{LogStatus, ProcessingLogDAL};
pub use qualifications::{IssuedQualification, QualificationDAL};
pub use requests::{CouponDraft, CreatedRequest, RequestDAL, RequestDraft, RequestFilter};
pub use retest::{RetestDAL, ScheduledRetest};

/// Root data access handle.
#[derive(Clone, Debug)]
pub struct DAL {
    database: Database,
}

impl DAL {
    /// Creates a new DAL over the given database.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Audit-log operations.
    pub fn processing_log(&self) -> ProcessingLogDAL<'_> {
        ProcessingLogDAL::new(self)
    }

    /// Request lifecycle operations and queries.
    pub fn requests(&self) -> RequestDAL<'_> {
        RequestDAL::new(self)
    }

    /// Coupon result entry.
    pub fn coupons(&self) -> CouponDAL<'_> {
        CouponDAL::new(self)
    }

    /// Qualification issuance.
    pub fn qualifications(&self) -> QualificationDAL<'_> {
        QualificationDAL::new(self)
    }

    /// Retest scheduling.
    pub fn retest(&self) -> RetestDAL<'_> {
        RetestDAL::new(self)
    }
}

/// Loads a request by its WCR number or reports it missing.
pub(crate) fn find_request(
    conn: &mut SqliteConnection,
    wcr_number: &str,
) -> Result<WeldRequest, WorkflowError> {
    weld_requests::table
        .filter(weld_requests::wcr_number.eq(wcr_number))
        .select(WeldRequest::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| WorkflowError::RequestNotFound {
            wcr_number: wcr_number.to_string(),
        })
}

/// Loads one coupon of a request by its dense coupon number.
pub(crate) fn find_coupon(
    conn: &mut SqliteConnection,
    request: &WeldRequest,
    coupon_number: i32,
) -> Result<Coupon, WorkflowError> {
    coupons_table::table
        .filter(coupons_table::request_id.eq(request.id))
        .filter(coupons_table::coupon_number.eq(coupon_number))
        .select(Coupon::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| WorkflowError::CouponNotFound {
            wcr_number: request.wcr_number.clone(),
            coupon_number,
        })
}

/// Recomputes a request's status from its coupons and persists the result
/// if it changed. Must run inside the transaction of the triggering
/// mutation.
pub(crate) fn apply_rollup(
    conn: &mut SqliteConnection,
    request_id: i32,
    current: RequestStatus,
) -> Result<RequestStatus, WorkflowError> {
    let stored: Vec<String> = coupons_table::table
        .filter(coupons_table::request_id.eq(request_id))
        .select(coupons_table::status)
        .load(conn)?;
    let statuses = stored
        .iter()
        .map(|s| s.parse::<CouponStatus>())
        .collect::<Result<Vec<_>, _>>()?;

    let next = status::recompute(current, &statuses);
    if next != current {
        diesel::update(weld_requests::table.find(request_id))
            .set((
                weld_requests::status.eq(next.as_str()),
                weld_requests::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;
        tracing::debug!(
            request_id,
            from = %current,
            to = %next,
            "Request status rolled up"
        );
    }
    Ok(next)
}

/// Parses a stored request status column.
pub(crate) fn request_status(request: &WeldRequest) -> Result<RequestStatus, WorkflowError> {
    Ok(request.status.parse::<RequestStatus>()?)
}

/// Parses a stored coupon status column.
pub(crate) fn coupon_status(coupon: &Coupon) -> Result<CouponStatus, WorkflowError> {
    Ok(coupon.status.parse::<CouponStatus>()?)
}

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

//! Request and coupon state machines and the status-rollup rule.
//!
//! Request lifecycle:
//! `pending_approval -> approved -> testing -> results_received -> completed`,
//! with `cancelled` reachable from any non-completed state.
//!
//! Coupon lifecycle: `pending -> testing -> passed | failed`, then
//! `passed -> wpq_assigned` or `failed -> retest_scheduled`. Both final hops
//! are one-way.
//!
//! [`recompute`] derives a request's status from its coupons. It is a pure
//! function and idempotent; the DAL runs it inside the same transaction as
//! whatever coupon mutation triggered it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored status column held a value outside the state machine.
#[derive(Error, Debug)]
#[error("unrecognized status value: {0}")]
pub struct UnknownStatusError(pub String);

/// Status of a weld certification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    PendingApproval,
    Approved,
    Testing,
    ResultsReceived,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::PendingApproval => "pending_approval",
            RequestStatus::Approved => "approved",
            RequestStatus::Testing => "testing",
            RequestStatus::ResultsReceived => "results_received",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Whether result entry is permitted in this state.
    pub fn accepts_results(&self) -> bool {
        matches!(
            self,
            RequestStatus::Approved | RequestStatus::Testing | RequestStatus::ResultsReceived
        )
    }

    /// Terminal states: no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_approval" => Ok(RequestStatus::PendingApproval),
            "approved" => Ok(RequestStatus::Approved),
            "testing" => Ok(RequestStatus::Testing),
            "results_received" => Ok(RequestStatus::ResultsReceived),
            "completed" => Ok(RequestStatus::Completed),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(UnknownStatusError(other.to_string())),
        }
    }
}

/// Status of a single test coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    Pending,
    Testing,
    Passed,
    Failed,
    WpqAssigned,
    RetestScheduled,
}

impl CouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponStatus::Pending => "pending",
            CouponStatus::Testing => "testing",
            CouponStatus::Passed => "passed",
            CouponStatus::Failed => "failed",
            CouponStatus::WpqAssigned => "wpq_assigned",
            CouponStatus::RetestScheduled => "retest_scheduled",
        }
    }

    /// Whether a test result may still be entered for this coupon.
    pub fn awaiting_result(&self) -> bool {
        matches!(self, CouponStatus::Pending | CouponStatus::Testing)
    }
}

impl fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CouponStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CouponStatus::Pending),
            "testing" => Ok(CouponStatus::Testing),
            "passed" => Ok(CouponStatus::Passed),
            "failed" => Ok(CouponStatus::Failed),
            "wpq_assigned" => Ok(CouponStatus::WpqAssigned),
            "retest_scheduled" => Ok(CouponStatus::RetestScheduled),
            other => Err(UnknownStatusError(other.to_string())),
        }
    }
}

/// Outcome of a coupon test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestResult {
    Pass,
    Fail,
}

impl TestResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestResult::Pass => "pass",
            TestResult::Fail => "fail",
        }
    }

    /// The coupon status a result entry produces.
    pub fn coupon_status(&self) -> CouponStatus {
        match self {
            TestResult::Pass => CouponStatus::Passed,
            TestResult::Fail => CouponStatus::Failed,
        }
    }
}

impl FromStr for TestResult {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(TestResult::Pass),
            "fail" => Ok(TestResult::Fail),
            other => Err(UnknownStatusError(other.to_string())),
        }
    }
}

/// Derives a request's status from its coupons' statuses.
///
/// Rules, evaluated in order:
/// 1. Non-empty and all coupons `passed`/`wpq_assigned` -> `completed`.
/// 2. All coupons `pending` (or no coupons) -> current status, unchanged.
///    A freshly created or freshly approved request never regresses.
/// 3. Any coupon `pending` or `testing` -> `testing`.
/// 4. Otherwise (a settled mix containing at least one `failed` or
///    `retest_scheduled`) -> `results_received`.
///
/// A request with a failed coupon therefore stays at `results_received`
/// forever, even after the failed coupon's retest is scheduled: rule 1 never
/// fires once `retest_scheduled` is in the set.
pub fn recompute(current: RequestStatus, coupons: &[CouponStatus]) -> RequestStatus {
    if !coupons.is_empty()
        && coupons
            .iter()
            .all(|s| matches!(s, CouponStatus::Passed | CouponStatus::WpqAssigned))
    {
        return RequestStatus::Completed;
    }
    if coupons.iter().all(|s| *s == CouponStatus::Pending) {
        return current;
    }
    if coupons
        .iter()
        .any(|s| matches!(s, CouponStatus::Pending | CouponStatus::Testing))
    {
        return RequestStatus::Testing;
    }
    RequestStatus::ResultsReceived
}

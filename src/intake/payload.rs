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

//! Wire types for the certification-request job payload.
//!
//! Fields are deliberately lenient (`Option` + defaults): structural
//! problems are reported by [`crate::intake::validation::validate`] as a
//! message list, not by serde failing on the first missing field.
//!
//! ```json
//! {
//!   "type": "certification_request",
//!   "welder": { "employee_number": "E-1041", "name": "Jane Doe", "stamp": "JD1" },
//!   "coupons": [ { "process": "SMAW", "position": "6G", "procedure_ref": "WPS-104" } ],
//!   "project": "P-77",
//!   "submitted_by": "shop foreman",
//!   "request_date": "2026-02-01"
//! }
//! ```

use chrono::NaiveDate;
use serde::Deserialize;

/// A certification-request submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CertificationRequestPayload {
    #[serde(default)]
    pub welder: WelderPayload,
    #[serde(default)]
    pub coupons: Vec<CouponPayload>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub request_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The welder block of a submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WelderPayload {
    #[serde(default)]
    pub employee_number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stamp: Option<String>,
    /// Declares a welder not yet in the registry; triggers registration
    #[serde(default)]
    pub is_new: bool,
}

impl WelderPayload {
    /// The employee number, trimmed, if non-empty.
    pub fn employee_number(&self) -> Option<&str> {
        self.employee_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The stamp, trimmed, if non-empty.
    pub fn stamp(&self) -> Option<&str> {
        self.stamp
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The display name, trimmed, if non-empty.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// One declared coupon.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponPayload {
    #[serde(default)]
    pub process: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub procedure_ref: Option<String>,
    #[serde(default)]
    pub base_material: Option<String>,
    #[serde(default)]
    pub filler_metal: Option<String>,
    #[serde(default)]
    pub thickness: Option<String>,
    #[serde(default)]
    pub diameter: Option<String>,
}

impl CouponPayload {
    /// The declared process, trimmed and uppercased, if non-empty.
    pub fn normalized_process(&self) -> Option<String> {
        self.process
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase)
    }
}

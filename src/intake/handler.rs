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

//! The certification-request job handler.
//!
//! Pipeline for one payload: structural validation, welder resolution, then
//! a single transaction creating the request and its coupons. Validation and
//! resolution failures come back as [`HandlerError::Rejected`] with the full
//! message list; database failures roll back and surface as
//! [`HandlerError::Workflow`]. Either way, a failed payload leaves no
//! partially created request behind.

use std::sync::Arc;

use tracing::{info, warn};

use super::payload::CertificationRequestPayload;
use super::validation::validate;
use super::welder::{resolve_welder, WelderDirectory, WelderRegistration};
use crate::config::WeldflowConfig;
use crate::dal::{CouponDraft, RequestDraft, DAL};
use crate::dispatcher::{HandlerOutcome, JobFile, JobHandler};
use crate::error::HandlerError;

/// The `type` value this handler claims.
pub const CERTIFICATION_REQUEST_JOB_TYPE: &str = "certification_request";

/// Handles `certification_request` job files.
pub struct CertificationRequestHandler {
    dal: Arc<DAL>,
    directory: Arc<dyn WelderDirectory>,
    registration: Arc<dyn WelderRegistration>,
    config: WeldflowConfig,
}

impl CertificationRequestHandler {
    pub fn new(
        dal: Arc<DAL>,
        directory: Arc<dyn WelderDirectory>,
        registration: Arc<dyn WelderRegistration>,
        config: WeldflowConfig,
    ) -> Self {
        Self {
            dal,
            directory,
            registration,
            config,
        }
    }
}

impl JobHandler for CertificationRequestHandler {
    fn job_type(&self) -> &'static str {
        CERTIFICATION_REQUEST_JOB_TYPE
    }

    fn handler_module(&self) -> &'static str {
        "intake::handler"
    }

    fn handle(&self, job: &JobFile) -> Result<HandlerOutcome, HandlerError> {
        let payload: CertificationRequestPayload =
            serde_json::from_value(job.payload.clone())
                .map_err(|e| HandlerError::Rejected(vec![format!("malformed payload: {}", e)]))?;

        let errors = validate(&payload, self.config.max_coupons_per_request);
        if !errors.is_empty() {
            warn!(file = %job.file_name, count = errors.len(), "Payload failed validation");
            return Err(HandlerError::Rejected(errors));
        }

        let welder = resolve_welder(
            self.directory.as_ref(),
            self.registration.as_ref(),
            &payload.welder,
        )
        .map_err(HandlerError::Rejected)?;

        let welder_name = payload
            .welder
            .name()
            .unwrap_or_default()
            .to_string();
        let draft = RequestDraft {
            welder_id: Some(welder.id),
            employee_number: payload.welder.employee_number().map(str::to_string),
            welder_name: welder_name.clone(),
            welder_stamp: welder.stamp,
            project: payload.project.clone(),
            request_date: payload.request_date,
            submitted_by: payload.submitted_by.clone(),
            source_file: Some(job.file_name.clone()),
            is_new_welder: welder.newly_registered,
            notes: payload.notes.clone(),
            coupons: payload
                .coupons
                .iter()
                .map(|coupon| CouponDraft {
                    // Validation already proved the process present and known.
                    process: coupon.normalized_process().unwrap_or_default(),
                    position: coupon.position.clone(),
                    procedure_ref: coupon.procedure_ref.clone(),
                    base_material: coupon.base_material.clone(),
                    filler_metal: coupon.filler_metal.clone(),
                    thickness: coupon.thickness.clone(),
                    diameter: coupon.diameter.clone(),
                })
                .collect(),
        };

        let created = self
            .dal
            .requests()
            .create_with_coupons(draft, &self.config.wcr_prefix)?;

        info!(
            wcr_number = %created.wcr_number,
            file = %job.file_name,
            "Certification request created from job file"
        );
        Ok(HandlerOutcome {
            summary: format!(
                "Created {} with {} coupon(s) for {}",
                created.wcr_number, created.coupon_count, welder_name
            ),
        })
    }
}

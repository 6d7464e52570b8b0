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

//! Structural validation of a certification-request payload.
//!
//! [`validate`] returns a list of human-readable errors; an empty list
//! means the payload is structurally sound. Validation never touches the
//! database - welder existence is the resolver's concern.

use super::payload::CertificationRequestPayload;

/// The fixed set of recognized welding processes.
pub const WELD_PROCESSES: &[&str] = &["SMAW", "GTAW", "GMAW", "FCAW", "SAW"];

/// Validates a payload, returning one message per problem found.
pub fn validate(payload: &CertificationRequestPayload, max_coupons: usize) -> Vec<String> {
    let mut errors = Vec::new();

    if payload.welder.employee_number().is_none() && payload.welder.stamp().is_none() {
        errors.push("welder must carry an employee number or a stamp".to_string());
    }
    if payload.welder.name().is_none() {
        errors.push("welder name is required".to_string());
    }

    if payload.coupons.is_empty() {
        errors.push("at least one coupon is required".to_string());
    } else if payload.coupons.len() > max_coupons {
        errors.push(format!(
            "too many coupons: {} declared, maximum is {}",
            payload.coupons.len(),
            max_coupons
        ));
    }

    for (index, coupon) in payload.coupons.iter().enumerate() {
        match coupon.normalized_process() {
            None => errors.push(format!("coupon {}: process is required", index + 1)),
            Some(process) if !WELD_PROCESSES.contains(&process.as_str()) => {
                errors.push(format!(
                    "coupon {}: unknown process {:?}, expected one of {}",
                    index + 1,
                    process,
                    WELD_PROCESSES.join(", ")
                ));
            }
            Some(_) => {}
        }
    }

    errors
}

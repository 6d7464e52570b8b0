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

//! Intake pipeline for certification-request jobs: payload types,
//! structural validation, welder resolution, and the job handler that ties
//! them together.

pub mod handler;
pub mod payload;
pub mod validation;
pub mod welder;

pub use handler::{CertificationRequestHandler, CERTIFICATION_REQUEST_JOB_TYPE};
pub use payload::{CertificationRequestPayload, CouponPayload, WelderPayload};
pub use validation::{validate, WELD_PROCESSES};
pub use welder::{
    resolve_welder, NewWelderRegistration, RegistrationOutcome, ResolvedWelder,
    SqliteWelderDirectory, WelderDirectory, WelderIdentity, WelderRegistration,
};

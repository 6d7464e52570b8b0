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

//! Row types for the weldflow tables.

pub mod coupon;
pub mod processing_log;
pub mod qualification;
pub mod request;
pub mod welder;

pub use coupon::{Coupon, NewCoupon};
pub use processing_log::{NewProcessingLogEntry, ProcessingLogEntry};
pub use qualification::{NewQualification, Qualification};
pub use request::{NewWeldRequest, WeldRequest};
pub use welder::{NewWelder, Welder};

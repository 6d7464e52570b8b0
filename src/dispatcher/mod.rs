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

//! File-based job dispatching: the handler registry and the directory scan
//! loop with audit logging, duplicate suppression, and quarantine moves.

pub mod job_dispatcher;
pub mod registry;

pub use job_dispatcher::{JobDispatcher, JobOutcome, ScanSummary};
pub use registry::{HandlerOutcome, HandlerRegistry, JobFile, JobHandler, RegistryError};

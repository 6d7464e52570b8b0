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

//! Processing Log Model
//!
//! One row per job file the dispatcher processed. Rows are append-only:
//! after creation they are finalized exactly once with a terminal status and
//! completion timestamp, and never touched again.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

/// An audit-log row for one dispatched job file.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::database::schema::processing_log)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProcessingLogEntry {
    /// Unique identifier for the log entry
    pub id: i32,
    /// Name of the job file as found in the incoming directory
    pub file_name: String,
    /// Declared `type` discriminator, when the payload carried one
    pub job_type: Option<String>,
    /// Processing status: `pending`, `processing`, `success`, or `failed`
    pub status: String,
    /// Module name of the handler that owned the job type
    pub handler_module: Option<String>,
    /// Human-readable summary of what the handler did
    pub result_summary: Option<String>,
    /// Error message for failed jobs
    pub error_message: Option<String>,
    /// Raw source payload, kept for post-mortem even when unparsable
    pub source_payload: Option<String>,
    /// SHA-256 of the raw payload, used for duplicate suppression
    pub content_hash: Option<String>,
    /// When processing of this file started
    pub created_at: NaiveDateTime,
    /// When processing reached a terminal status
    pub completed_at: Option<NaiveDateTime>,
}

/// A new processing-log row.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::database::schema::processing_log)]
pub struct NewProcessingLogEntry {
    pub file_name: String,
    pub job_type: Option<String>,
    pub status: String,
    pub handler_module: Option<String>,
    pub result_summary: Option<String>,
    pub error_message: Option<String>,
    pub source_payload: Option<String>,
    pub content_hash: Option<String>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

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

//! Audit-log DAL for the job dispatcher.
//!
//! Rows are append-only: `begin` creates a row in `processing` status,
//! `finalize_*` closes it exactly once, `record_failed` writes an
//! already-terminal row for files that never reached a handler. Finalize
//! filters on the `processing` status so a finalized row cannot be rewritten.

use chrono::Utc;
use diesel::prelude::*;

use super::DAL;
use crate::database::schema::processing_log;
use crate::error::DalError;
use crate::models::{NewProcessingLogEntry, ProcessingLogEntry};

/// Audit-log row status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Pending => "pending",
            LogStatus::Processing => "processing",
            LogStatus::Success => "success",
            LogStatus::Failed => "failed",
        }
    }
}

/// Data access for the dispatcher's processing log.
#[derive(Clone)]
pub struct ProcessingLogDAL<'a> {
    dal: &'a DAL,
}

impl<'a> ProcessingLogDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Opens a log row for a job about to be handled. Returns the row id.
    pub fn begin(
        &self,
        file_name: &str,
        job_type: &str,
        handler_module: &str,
        source_payload: &str,
        content_hash: &str,
    ) -> Result<i32, DalError> {
        let mut conn = self.dal.database().conn()?;
        let entry = NewProcessingLogEntry {
            file_name: file_name.to_string(),
            job_type: Some(job_type.to_string()),
            status: LogStatus::Processing.as_str().to_string(),
            handler_module: Some(handler_module.to_string()),
            result_summary: None,
            error_message: None,
            source_payload: Some(source_payload.to_string()),
            content_hash: Some(content_hash.to_string()),
            created_at: Utc::now().naive_utc(),
            completed_at: None,
        };
        let id = diesel::insert_into(processing_log::table)
            .values(&entry)
            .returning(processing_log::id)
            .get_result(&mut conn)?;
        Ok(id)
    }

    /// Closes a log row as successful.
    pub fn finalize_success(&self, id: i32, summary: &str) -> Result<(), DalError> {
        let mut conn = self.dal.database().conn()?;
        diesel::update(
            processing_log::table
                .find(id)
                .filter(processing_log::status.eq(LogStatus::Processing.as_str())),
        )
        .set((
            processing_log::status.eq(LogStatus::Success.as_str()),
            processing_log::result_summary.eq(summary),
            processing_log::completed_at.eq(Some(Utc::now().naive_utc())),
        ))
        .execute(&mut conn)?;
        Ok(())
    }

    /// Closes a log row as failed.
    pub fn finalize_failed(&self, id: i32, error: &str) -> Result<(), DalError> {
        let mut conn = self.dal.database().conn()?;
        diesel::update(
            processing_log::table
                .find(id)
                .filter(processing_log::status.eq(LogStatus::Processing.as_str())),
        )
        .set((
            processing_log::status.eq(LogStatus::Failed.as_str()),
            processing_log::error_message.eq(error),
            processing_log::completed_at.eq(Some(Utc::now().naive_utc())),
        ))
        .execute(&mut conn)?;
        Ok(())
    }

    /// Writes a terminal `failed` row for a file that never reached a
    /// handler (unparsable, missing type, unknown type).
    pub fn record_failed(
        &self,
        file_name: &str,
        job_type: Option<&str>,
        error: &str,
        source_payload: Option<&str>,
    ) -> Result<i32, DalError> {
        let mut conn = self.dal.database().conn()?;
        let now = Utc::now().naive_utc();
        let entry = NewProcessingLogEntry {
            file_name: file_name.to_string(),
            job_type: job_type.map(str::to_string),
            status: LogStatus::Failed.as_str().to_string(),
            handler_module: None,
            result_summary: None,
            error_message: Some(error.to_string()),
            source_payload: source_payload.map(str::to_string),
            content_hash: None,
            created_at: now,
            completed_at: Some(now),
        };
        let id = diesel::insert_into(processing_log::table)
            .values(&entry)
            .returning(processing_log::id)
            .get_result(&mut conn)?;
        Ok(id)
    }

    /// Writes a terminal `success` row for a duplicate payload that was
    /// suppressed without invoking a handler.
    pub fn record_duplicate(
        &self,
        file_name: &str,
        job_type: &str,
        content_hash: &str,
        summary: &str,
    ) -> Result<i32, DalError> {
        let mut conn = self.dal.database().conn()?;
        let now = Utc::now().naive_utc();
        let entry = NewProcessingLogEntry {
            file_name: file_name.to_string(),
            job_type: Some(job_type.to_string()),
            status: LogStatus::Success.as_str().to_string(),
            handler_module: None,
            result_summary: Some(summary.to_string()),
            error_message: None,
            source_payload: None,
            content_hash: Some(content_hash.to_string()),
            created_at: now,
            completed_at: Some(now),
        };
        let id = diesel::insert_into(processing_log::table)
            .values(&entry)
            .returning(processing_log::id)
            .get_result(&mut conn)?;
        Ok(id)
    }

    /// Whether a payload with this hash has already been handled
    /// successfully. The dedupe key for at-least-once delivery.
    pub fn has_successful(&self, content_hash: &str) -> Result<bool, DalError> {
        use diesel::dsl::count_star;

        let mut conn = self.dal.database().conn()?;
        let matches: i64 = processing_log::table
            .filter(processing_log::content_hash.eq(content_hash))
            .filter(processing_log::status.eq(LogStatus::Success.as_str()))
            .select(count_star())
            .first(&mut conn)?;
        Ok(matches > 0)
    }

    /// Most recent log entries, newest first.
    pub fn recent(&self, limit: i64) -> Result<Vec<ProcessingLogEntry>, DalError> {
        let mut conn = self.dal.database().conn()?;
        let entries = processing_log::table
            .order(processing_log::created_at.desc())
            .limit(limit)
            .select(ProcessingLogEntry::as_select())
            .load(&mut conn)?;
        Ok(entries)
    }
}

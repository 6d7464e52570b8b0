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

//! Directory scan loop.
//!
//! `process_all` scans the incoming directory in name order; a failure in one
//! file never aborts the scan. `process_one` takes a file through parse, type
//! lookup, duplicate suppression, handler invocation, audit logging, and the
//! final move to processed/ or failed/. Moves carry a timestamp prefix so a
//! resubmitted file name cannot collide with an earlier run.
//!
//! Delivery is at-least-once: a crash between handler success and file move
//! replays the file on the next scan. Byte-identical replays are suppressed
//! by a SHA-256 content hash checked against prior `success` audit rows, so
//! replayed files settle without re-invoking the handler.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use super::registry::{HandlerRegistry, JobFile};
use crate::config::WeldflowConfig;
use crate::dal::DAL;
use crate::error::DispatchError;

/// Counters for one full scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Job files considered
    pub scanned: usize,
    /// Handled successfully
    pub succeeded: usize,
    /// Failed at any stage (parse, lookup, handler)
    pub failed: usize,
    /// Suppressed as byte-identical duplicates
    pub duplicates: usize,
}

/// What happened to one job file.
#[derive(Debug)]
pub enum JobOutcome {
    /// Handler ran and succeeded; file moved to the processed directory.
    Handled { job_type: String, summary: String },
    /// Byte-identical payload already handled; no handler call, file moved
    /// to the processed directory.
    Duplicate { job_type: String },
    /// Parse, lookup, or handler failure; file moved to the failed
    /// directory.
    Failed {
        job_type: Option<String>,
        error: String,
    },
    /// Dry run verdict. Nothing was logged or moved.
    DryRun { report: String },
}

/// The job dispatcher.
pub struct JobDispatcher {
    dal: Arc<DAL>,
    registry: Arc<HandlerRegistry>,
    incoming_dir: PathBuf,
    processed_dir: PathBuf,
    failed_dir: PathBuf,
}

impl JobDispatcher {
    pub fn new(dal: Arc<DAL>, registry: Arc<HandlerRegistry>, config: &WeldflowConfig) -> Self {
        Self {
            dal,
            registry,
            incoming_dir: config.incoming_dir.clone(),
            processed_dir: config.processed_dir.clone(),
            failed_dir: config.failed_dir.clone(),
        }
    }

    /// Scans the incoming directory in name order and processes every job
    /// file. Individual failures are counted, logged, and skipped past.
    pub fn process_all(&self) -> Result<ScanSummary, DispatchError> {
        let mut paths = self.job_files()?;
        paths.sort();

        let mut summary = ScanSummary::default();
        for path in paths {
            summary.scanned += 1;
            match self.process_one(&path, false) {
                Ok(JobOutcome::Handled { .. }) => summary.succeeded += 1,
                Ok(JobOutcome::Duplicate { .. }) => summary.duplicates += 1,
                Ok(JobOutcome::Failed { .. }) => summary.failed += 1,
                Ok(JobOutcome::DryRun { .. }) => unreachable!("scan never runs dry"),
                Err(e) => {
                    // Environmental failure on this file; the scan goes on.
                    error!(path = %path.display(), error = %e, "Job file could not be processed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            scanned = summary.scanned,
            succeeded = summary.succeeded,
            failed = summary.failed,
            duplicates = summary.duplicates,
            "Scan complete"
        );
        Ok(summary)
    }

    /// Processes one job file.
    ///
    /// With `dry_run` set, the file is read, parsed, and resolved against
    /// the registry, and the verdict is reported; nothing is logged to the
    /// database and the file stays where it is.
    pub fn process_one(&self, path: &Path, dry_run: bool) -> Result<JobOutcome, DispatchError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let raw = std::fs::read_to_string(path).map_err(|source| DispatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let payload: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                let message = format!("unparsable job file: {}", e);
                if dry_run {
                    return Ok(JobOutcome::DryRun {
                        report: format!("{}: would fail ({})", file_name, message),
                    });
                }
                return self.quarantine(path, &file_name, None, &message, Some(&raw));
            }
        };

        let job_type = match payload.get("type").and_then(|v| v.as_str()) {
            Some(job_type) => job_type.to_string(),
            None => {
                let message = "job file has no \"type\" field".to_string();
                if dry_run {
                    return Ok(JobOutcome::DryRun {
                        report: format!("{}: would fail ({})", file_name, message),
                    });
                }
                return self.quarantine(path, &file_name, None, &message, Some(&raw));
            }
        };

        let Some(handler) = self.registry.get(&job_type) else {
            let message = format!("no handler registered for job type {:?}", job_type);
            if dry_run {
                return Ok(JobOutcome::DryRun {
                    report: format!("{}: would fail ({})", file_name, message),
                });
            }
            return self.quarantine(path, &file_name, Some(&job_type), &message, Some(&raw));
        };

        if dry_run {
            return Ok(JobOutcome::DryRun {
                report: format!(
                    "{}: would invoke handler {} for type {:?}",
                    file_name,
                    handler.handler_module(),
                    job_type
                ),
            });
        }

        let content_hash = payload_hash(&raw);
        if self.dal.processing_log().has_successful(&content_hash)? {
            self.dal.processing_log().record_duplicate(
                &file_name,
                &job_type,
                &content_hash,
                "duplicate payload, already processed",
            )?;
            self.move_to(path, &self.processed_dir)?;
            info!(file = %file_name, job_type, "Duplicate payload suppressed");
            return Ok(JobOutcome::Duplicate { job_type });
        }

        let log_id = self.dal.processing_log().begin(
            &file_name,
            &job_type,
            handler.handler_module(),
            &raw,
            &content_hash,
        )?;

        let job = JobFile {
            file_name: file_name.clone(),
            payload,
        };
        match handler.handle(&job) {
            Ok(outcome) => {
                self.dal
                    .processing_log()
                    .finalize_success(log_id, &outcome.summary)?;
                self.move_to(path, &self.processed_dir)?;
                info!(file = %file_name, job_type, summary = %outcome.summary, "Job handled");
                Ok(JobOutcome::Handled {
                    job_type,
                    summary: outcome.summary,
                })
            }
            Err(e) => {
                let message = e.to_string();
                self.dal.processing_log().finalize_failed(log_id, &message)?;
                self.move_to(path, &self.failed_dir)?;
                warn!(file = %file_name, job_type, error = %message, "Job failed");
                Ok(JobOutcome::Failed {
                    job_type: Some(job_type),
                    error: message,
                })
            }
        }
    }

    /// Files in the incoming directory, unsorted. A missing incoming
    /// directory reads as an empty queue.
    fn job_files(&self) -> Result<Vec<PathBuf>, DispatchError> {
        let entries = match std::fs::read_dir(&self.incoming_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(DispatchError::Io {
                    path: self.incoming_dir.clone(),
                    source,
                })
            }
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DispatchError::Io {
                path: self.incoming_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Logs a terminal `failed` row for a file that never reached a handler
    /// and moves it to the failed directory.
    fn quarantine(
        &self,
        path: &Path,
        file_name: &str,
        job_type: Option<&str>,
        message: &str,
        raw: Option<&str>,
    ) -> Result<JobOutcome, DispatchError> {
        self.dal
            .processing_log()
            .record_failed(file_name, job_type, message, raw)?;
        self.move_to(path, &self.failed_dir)?;
        warn!(file = %file_name, error = %message, "Job file quarantined");
        Ok(JobOutcome::Failed {
            job_type: job_type.map(str::to_string),
            error: message.to_string(),
        })
    }

    /// Moves a file into `dir` under a timestamp-prefixed name.
    fn move_to(&self, path: &Path, dir: &Path) -> Result<(), DispatchError> {
        std::fs::create_dir_all(dir).map_err(|source| DispatchError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "job".to_string());
        let stamped = format!("{}_{}", Utc::now().format("%Y%m%d%H%M%S%f"), file_name);
        let target = dir.join(stamped);

        std::fs::rename(path, &target).map_err(|source| DispatchError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Hex SHA-256 of the raw file contents; the dedupe key.
fn payload_hash(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::payload_hash;

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        let a = payload_hash("{\"type\":\"x\"}");
        let b = payload_hash("{\"type\":\"x\"}");
        let c = payload_hash("{\"type\":\"y\"}");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}

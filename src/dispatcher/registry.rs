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

//! Explicit handler registry.
//!
//! The registry is an ordinary value constructed at process start and handed
//! to the dispatcher by reference. Nothing registers itself at import time,
//! so the set of handlers is visible at the call site that builds it.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::error::HandlerError;

/// One job file, parsed, on its way to a handler.
#[derive(Debug, Clone)]
pub struct JobFile {
    /// Original file name, carried into the audit log and the request row
    pub file_name: String,
    /// The parsed payload, `type` discriminator included
    pub payload: serde_json::Value,
}

/// What a handler reports on success. The summary lands in the audit log.
#[derive(Debug, Clone)]
pub struct HandlerOutcome {
    pub summary: String,
}

/// A handler for one job type.
///
/// Handlers must tolerate being invoked more than once for the same logical
/// payload: the file-based queue is at-least-once, and the dispatcher's
/// content-hash dedupe only suppresses byte-identical resubmissions.
pub trait JobHandler: Send + Sync {
    /// The `type` discriminator this handler claims.
    fn job_type(&self) -> &'static str;

    /// Module name recorded in the audit log.
    fn handler_module(&self) -> &'static str;

    /// Processes one payload.
    fn handle(&self, job: &JobFile) -> Result<HandlerOutcome, HandlerError>;
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("a handler for job type {0:?} is already registered")]
    DuplicateJobType(String),
}

/// Maps job type strings to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its declared job type. Claiming a type
    /// twice is a configuration mistake and fails loudly.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) -> Result<(), RegistryError> {
        let job_type = handler.job_type();
        if self.handlers.contains_key(job_type) {
            return Err(RegistryError::DuplicateJobType(job_type.to_string()));
        }
        self.handlers.insert(job_type, handler);
        Ok(())
    }

    /// Looks up the handler for a job type.
    pub fn get(&self, job_type: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(job_type).cloned()
    }

    /// Registered job types, sorted.
    pub fn job_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubHandler(&'static str);

    impl JobHandler for StubHandler {
        fn job_type(&self) -> &'static str {
            self.0
        }

        fn handler_module(&self) -> &'static str {
            "tests::stub"
        }

        fn handle(&self, _job: &JobFile) -> Result<HandlerOutcome, HandlerError> {
            Ok(HandlerOutcome {
                summary: "ok".to_string(),
            })
        }
    }

    #[test]
    fn registers_and_resolves_by_type() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(StubHandler("alpha"))).unwrap();
        registry.register(Arc::new(StubHandler("beta"))).unwrap();

        assert!(registry.get("alpha").is_some());
        assert!(registry.get("gamma").is_none());
        assert_eq!(registry.job_types(), vec!["alpha", "beta"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn rejects_a_duplicate_job_type() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(StubHandler("alpha"))).unwrap();
        let err = registry.register(Arc::new(StubHandler("alpha"))).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateJobType(t) if t == "alpha"));
    }
}

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

//! Shared fixtures: a temp-directory environment with a file-backed SQLite
//! database, job directories, and a fully wired dispatcher.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use weldflow::config::WeldflowConfig;
use weldflow::dal::{CouponDraft, RequestDraft, DAL};
use weldflow::database::Database;
use weldflow::dispatcher::{HandlerRegistry, JobDispatcher};
use weldflow::intake::{
    CertificationRequestHandler, NewWelderRegistration, SqliteWelderDirectory, WelderRegistration,
};

pub struct TestEnv {
    // Dropping the TempDir deletes the database and job directories.
    _dir: TempDir,
    pub config: WeldflowConfig,
    pub database: Database,
    pub dal: Arc<DAL>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(tweak: impl FnOnce(&mut WeldflowConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WeldflowConfig::default();
        config.incoming_dir = dir.path().join("incoming");
        config.processed_dir = dir.path().join("processed");
        config.failed_dir = dir.path().join("failed");
        tweak(&mut config);
        std::fs::create_dir_all(&config.incoming_dir).unwrap();

        let db_path = dir.path().join("weldflow.db");
        let database = Database::new(db_path.to_str().unwrap(), config.db_pool_size).unwrap();
        let dal = Arc::new(DAL::new(database.clone()));
        Self {
            _dir: dir,
            config,
            database,
            dal,
        }
    }

    /// A dispatcher with the certification-request handler registered.
    pub fn dispatcher(&self) -> JobDispatcher {
        let welders = Arc::new(SqliteWelderDirectory::new(self.database.clone()));
        let mut registry = HandlerRegistry::new();
        registry
            .register(Arc::new(CertificationRequestHandler::new(
                self.dal.clone(),
                welders.clone(),
                welders,
                self.config.clone(),
            )))
            .unwrap();
        JobDispatcher::new(self.dal.clone(), Arc::new(registry), &self.config)
    }

    /// Registers a welder directly in the registry table.
    pub fn seed_welder(&self, employee_number: &str, stamp: Option<&str>) -> i32 {
        let directory = SqliteWelderDirectory::new(self.database.clone());
        let outcome = directory
            .register(NewWelderRegistration {
                employee_number,
                first_name: "Jane",
                last_name: "Doe",
                stamp,
                auto_assign_stamp: false,
            })
            .unwrap();
        assert!(outcome.errors.is_empty(), "seed failed: {:?}", outcome.errors);
        outcome.id
    }

    /// Drops a job file into the incoming directory.
    pub fn write_job(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.config.incoming_dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// File names in a directory, sorted. Missing directory reads as empty.
    pub fn files_in(&self, dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

/// A ready-to-create request draft with one coupon per process.
pub fn draft(stamp: Option<&str>, processes: &[&str]) -> RequestDraft {
    RequestDraft {
        welder_id: None,
        employee_number: Some("E-1041".to_string()),
        welder_name: "Jane Doe".to_string(),
        welder_stamp: stamp.map(str::to_string),
        project: Some("P-77".to_string()),
        request_date: None,
        submitted_by: Some("shop foreman".to_string()),
        source_file: None,
        is_new_welder: false,
        notes: None,
        coupons: processes
            .iter()
            .map(|process| CouponDraft {
                process: process.to_string(),
                position: Some("6G".to_string()),
                procedure_ref: Some("WPS-104".to_string()),
                ..CouponDraft::default()
            })
            .collect(),
    }
}

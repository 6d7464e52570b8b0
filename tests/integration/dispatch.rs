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

//! Dispatcher behavior against a real directory tree: scanning, quarantine,
//! dry runs, duplicate suppression, and handler wiring.

use weldflow::dal::RequestFilter;
use weldflow::dispatcher::JobOutcome;

use crate::fixtures::TestEnv;

const GOOD_JOB: &str = r#"{
    "type": "certification_request",
    "welder": { "employee_number": "E-1041", "name": "Jane Doe", "stamp": "JD1" },
    "coupons": [
        { "process": "SMAW", "position": "6G", "procedure_ref": "WPS-104" },
        { "process": "GTAW" }
    ],
    "project": "P-77",
    "submitted_by": "shop foreman",
    "request_date": "2026-02-01"
}"#;

#[test]
fn a_valid_job_creates_a_request_and_moves_the_file() {
    let env = TestEnv::new();
    env.seed_welder("E-1041", Some("JD1"));
    env.write_job("job.json", GOOD_JOB);

    let summary = env.dispatcher().process_all().unwrap();
    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);

    let requests = env.dal.requests().list(&RequestFilter::default()).unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].source_file.as_deref(), Some("job.json"));
    assert_eq!(requests[0].welder_stamp.as_deref(), Some("JD1"));

    // Moved with a timestamp prefix; incoming is drained.
    assert!(env.files_in(&env.config.incoming_dir).is_empty());
    let processed = env.files_in(&env.config.processed_dir);
    assert_eq!(processed.len(), 1);
    assert!(processed[0].ends_with("_job.json"));

    let log = env.dal.processing_log().recent(10).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].status, "success");
    assert_eq!(log[0].job_type.as_deref(), Some("certification_request"));
    assert!(log[0].completed_at.is_some());
    assert!(log[0].result_summary.as_deref().unwrap().contains("2 coupon"));
}

#[test]
fn one_bad_file_does_not_abort_the_scan() {
    let env = TestEnv::new();
    env.seed_welder("E-1041", Some("JD1"));
    // Name order puts the broken file first.
    env.write_job("1_broken.json", "this is not json {");
    env.write_job("2_good.json", GOOD_JOB);

    let summary = env.dispatcher().process_all().unwrap();
    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);

    let failed = env.files_in(&env.config.failed_dir);
    assert_eq!(failed.len(), 1);
    assert!(failed[0].ends_with("_1_broken.json"));
    assert_eq!(env.files_in(&env.config.processed_dir).len(), 1);
    assert_eq!(env.dal.requests().list(&RequestFilter::default()).unwrap().len(), 1);
}

#[test]
fn missing_and_unknown_types_are_quarantined() {
    let env = TestEnv::new();
    env.write_job("untyped.json", r#"{ "welder": {} }"#);
    env.write_job("unknown.json", r#"{ "type": "pressure_test" }"#);

    let summary = env.dispatcher().process_all().unwrap();
    assert_eq!(summary.failed, 2);
    assert_eq!(env.files_in(&env.config.failed_dir).len(), 2);

    let log = env.dal.processing_log().recent(10).unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|e| e.status == "failed"));
    let unknown = log.iter().find(|e| e.file_name == "unknown.json").unwrap();
    assert_eq!(unknown.job_type.as_deref(), Some("pressure_test"));
    assert!(unknown
        .error_message
        .as_deref()
        .unwrap()
        .contains("no handler registered"));
    // The raw text is preserved for post-mortems.
    assert!(unknown.source_payload.is_some());
}

#[test]
fn a_rejected_payload_is_failed_with_the_error_list() {
    let env = TestEnv::new();
    // Unknown welder, no is_new flag.
    env.write_job("job.json", GOOD_JOB);

    let summary = env.dispatcher().process_all().unwrap();
    assert_eq!(summary.failed, 1);
    assert!(env.dal.requests().list(&RequestFilter::default()).unwrap().is_empty());

    let log = env.dal.processing_log().recent(10).unwrap();
    assert_eq!(log[0].status, "failed");
    assert!(log[0].error_message.as_deref().unwrap().contains("not found"));
}

#[test]
fn dry_run_changes_nothing() {
    let env = TestEnv::new();
    env.seed_welder("E-1041", Some("JD1"));
    let path = env.write_job("job.json", GOOD_JOB);

    let outcome = env.dispatcher().process_one(&path, true).unwrap();
    let JobOutcome::DryRun { report } = outcome else {
        panic!("expected a dry-run verdict");
    };
    assert!(report.contains("would invoke"));
    assert!(report.contains("certification_request"));

    // File untouched, no audit rows, no request.
    assert!(path.exists());
    assert!(env.dal.processing_log().recent(10).unwrap().is_empty());
    assert!(env.dal.requests().list(&RequestFilter::default()).unwrap().is_empty());

    // A broken file is reported, not quarantined.
    let broken = env.write_job("broken.json", "{");
    let outcome = env.dispatcher().process_one(&broken, true).unwrap();
    assert!(matches!(outcome, JobOutcome::DryRun { .. }));
    assert!(broken.exists());
}

#[test]
fn byte_identical_resubmissions_are_suppressed() {
    let env = TestEnv::new();
    env.seed_welder("E-1041", Some("JD1"));
    env.write_job("first.json", GOOD_JOB);
    env.dispatcher().process_all().unwrap();

    // Same bytes under a different name: the queue is at-least-once.
    env.write_job("replay.json", GOOD_JOB);
    let summary = env.dispatcher().process_all().unwrap();
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.succeeded, 0);

    // One request, two success rows, replay file settled into processed.
    assert_eq!(env.dal.requests().list(&RequestFilter::default()).unwrap().len(), 1);
    assert_eq!(env.files_in(&env.config.processed_dir).len(), 2);
    let log = env.dal.processing_log().recent(10).unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|e| e.status == "success"));
}

#[test]
fn a_new_welder_is_registered_during_intake() {
    let env = TestEnv::new();
    let job = r#"{
        "type": "certification_request",
        "welder": { "employee_number": "E-2000", "name": "Sam Smith", "is_new": true },
        "coupons": [ { "process": "FCAW" } ]
    }"#;
    env.write_job("job.json", job);

    let summary = env.dispatcher().process_all().unwrap();
    assert_eq!(summary.succeeded, 1);

    let requests = env.dal.requests().list(&RequestFilter::default()).unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].is_new_welder);
    assert!(requests[0].welder_id.is_some());
    // Stamp auto-assigned by the registry adapter.
    assert!(requests[0].welder_stamp.as_deref().unwrap().starts_with('W'));
}

#[test]
fn a_missing_incoming_directory_reads_as_an_empty_queue() {
    let env = TestEnv::new();
    std::fs::remove_dir(&env.config.incoming_dir).unwrap();
    let summary = env.dispatcher().process_all().unwrap();
    assert_eq!(summary.scanned, 0);
}

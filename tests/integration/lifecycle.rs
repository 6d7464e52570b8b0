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

//! Full request lifecycle against a real database: numbering, approval
//! guards, result entry, rollup, qualification issuance, retest scheduling.

use chrono::Datelike;

use weldflow::dal::{RequestFilter, ResultEntry};
use weldflow::error::WorkflowError;
use weldflow::workflow::status::{CouponStatus, RequestStatus, TestResult};

use crate::fixtures::{draft, TestEnv};

fn wcr(seq: u32) -> String {
    format!("WCR-{}-{:04}", chrono::Utc::now().year(), seq)
}

#[test]
fn two_coupon_walkthrough() {
    let env = TestEnv::new();
    let requests = env.dal.requests();
    let coupons = env.dal.coupons();

    let created = requests
        .create_with_coupons(draft(Some("JD1"), &["SMAW", "GTAW"]), "WCR")
        .unwrap();
    assert_eq!(created.wcr_number, wcr(1));
    assert_eq!(created.coupon_count, 2);

    let (request, request_coupons) = requests.get_with_coupons(&created.wcr_number).unwrap().unwrap();
    assert_eq!(request.status, "pending_approval");
    assert_eq!(request_coupons.len(), 2);
    assert!(request_coupons.iter().all(|c| c.status == "pending"));
    assert_eq!(request_coupons[0].coupon_number, 1);
    assert_eq!(request_coupons[1].coupon_number, 2);

    // Results are not accepted before approval.
    let premature = coupons.enter_result(&created.wcr_number, 1, ResultEntry::of(TestResult::Pass));
    assert!(matches!(
        premature,
        Err(WorkflowError::InvalidRequestState { .. })
    ));

    let approved = requests.approve(&created.wcr_number, "QA Lead").unwrap();
    assert_eq!(approved.status, "approved");
    assert_eq!(approved.approved_by.as_deref(), Some("QA Lead"));
    assert!(approved.approved_at.is_some());

    // Approval is not idempotent.
    assert!(matches!(
        requests.approve(&created.wcr_number, "QA Lead"),
        Err(WorkflowError::InvalidRequestState { .. })
    ));

    // First coupon passes; the second is still open.
    let recorded = coupons
        .enter_result(&created.wcr_number, 1, ResultEntry::of(TestResult::Pass))
        .unwrap();
    assert_eq!(recorded.coupon_status, CouponStatus::Passed);
    assert_eq!(recorded.request_status, RequestStatus::Testing);

    // Second coupon fails; everything is settled now.
    let entry = ResultEntry {
        tested_by: Some("lab".to_string()),
        failure_reason: Some("root crack on bend".to_string()),
        ..ResultEntry::of(TestResult::Fail)
    };
    let recorded = coupons.enter_result(&created.wcr_number, 2, entry).unwrap();
    assert_eq!(recorded.request_status, RequestStatus::ResultsReceived);

    // A settled coupon cannot be re-scored.
    assert!(matches!(
        coupons.enter_result(&created.wcr_number, 1, ResultEntry::of(TestResult::Fail)),
        Err(WorkflowError::InvalidCouponState { .. })
    ));

    // Qualification from the passed coupon; the failed one keeps the
    // request at results_received.
    let issued = env
        .dal
        .qualifications()
        .issue_from_coupon(&created.wcr_number, 1, 6)
        .unwrap();
    assert_eq!(issued.wpq_number, "JD1-WPS-104");
    assert_eq!(issued.request_status, RequestStatus::ResultsReceived);

    let (_, request_coupons) = requests.get_with_coupons(&created.wcr_number).unwrap().unwrap();
    assert_eq!(request_coupons[0].status, "wpq_assigned");
    assert_eq!(request_coupons[0].wpq_id, Some(issued.qualification_id));

    // Issuance is one-way.
    assert!(matches!(
        env.dal.qualifications().issue_from_coupon(&created.wcr_number, 1, 6),
        Err(WorkflowError::InvalidCouponState { .. })
    ));

    // Retest for the failed coupon spawns a linked request.
    let scheduled = env
        .dal
        .retest()
        .schedule_retest(&created.wcr_number, 2, "WCR", None)
        .unwrap();
    assert_eq!(scheduled.retest_wcr_number, wcr(2));
    assert_eq!(
        scheduled.original_request_status,
        RequestStatus::ResultsReceived
    );

    let (retest, retest_coupons) = requests
        .get_with_coupons(&scheduled.retest_wcr_number)
        .unwrap()
        .unwrap();
    assert_eq!(retest.status, "pending_approval");
    assert_eq!(retest.welder_stamp.as_deref(), Some("JD1"));
    assert!(retest.notes.as_deref().unwrap().contains(&created.wcr_number));
    assert_eq!(retest_coupons.len(), 1);
    assert_eq!(retest_coupons[0].process, "GTAW");
    assert_eq!(retest_coupons[0].status, "pending");

    let (_, request_coupons) = requests.get_with_coupons(&created.wcr_number).unwrap().unwrap();
    assert_eq!(request_coupons[1].status, "retest_scheduled");
    assert_eq!(request_coupons[1].retest_wcr_id, Some(scheduled.retest_request_id));

    // The original never completes; the retest request can.
    requests.approve(&scheduled.retest_wcr_number, "QA Lead").unwrap();
    let recorded = coupons
        .enter_result(&scheduled.retest_wcr_number, 1, ResultEntry::of(TestResult::Pass))
        .unwrap();
    assert_eq!(recorded.request_status, RequestStatus::Completed);
    let (original, _) = requests.get_with_coupons(&created.wcr_number).unwrap().unwrap();
    assert_eq!(original.status, "results_received");
}

#[test]
fn numbering_is_monotonic_within_a_year() {
    let env = TestEnv::new();
    for expected in 1..=3 {
        let created = env
            .dal
            .requests()
            .create_with_coupons(draft(Some("JD1"), &["SMAW"]), "WCR")
            .unwrap();
        assert_eq!(created.wcr_number, wcr(expected));
    }
}

#[test]
fn all_passed_coupons_complete_the_request() {
    let env = TestEnv::new();
    let created = env
        .dal
        .requests()
        .create_with_coupons(draft(Some("JD1"), &["SMAW", "GTAW"]), "WCR")
        .unwrap();
    env.dal.requests().approve(&created.wcr_number, "QA").unwrap();

    let coupons = env.dal.coupons();
    coupons
        .enter_result(&created.wcr_number, 1, ResultEntry::of(TestResult::Pass))
        .unwrap();
    let recorded = coupons
        .enter_result(&created.wcr_number, 2, ResultEntry::of(TestResult::Pass))
        .unwrap();
    assert_eq!(recorded.request_status, RequestStatus::Completed);

    // A completed request accepts nothing further.
    assert!(matches!(
        env.dal.requests().cancel(&created.wcr_number),
        Err(WorkflowError::InvalidRequestState { .. })
    ));
}

#[test]
fn cancel_is_valid_from_any_non_terminal_state() {
    let env = TestEnv::new();
    let created = env
        .dal
        .requests()
        .create_with_coupons(draft(Some("JD1"), &["SMAW"]), "WCR")
        .unwrap();

    let cancelled = env.dal.requests().cancel(&created.wcr_number).unwrap();
    assert_eq!(cancelled.status, "cancelled");
    assert!(matches!(
        env.dal.requests().cancel(&created.wcr_number),
        Err(WorkflowError::InvalidRequestState { .. })
    ));
}

#[test]
fn wpq_numbers_get_deterministic_collision_suffixes() {
    let env = TestEnv::new();
    let mut issued = Vec::new();
    for _ in 0..3 {
        let created = env
            .dal
            .requests()
            .create_with_coupons(draft(Some("JD1"), &["SMAW"]), "WCR")
            .unwrap();
        env.dal.requests().approve(&created.wcr_number, "QA").unwrap();
        env.dal
            .coupons()
            .enter_result(&created.wcr_number, 1, ResultEntry::of(TestResult::Pass))
            .unwrap();
        issued.push(
            env.dal
                .qualifications()
                .issue_from_coupon(&created.wcr_number, 1, 6)
                .unwrap()
                .wpq_number,
        );
    }
    assert_eq!(issued, vec!["JD1-WPS-104", "JD1-WPS-104-2", "JD1-WPS-104-3"]);
}

#[test]
fn wpq_number_falls_back_without_a_procedure_ref() {
    let env = TestEnv::new();
    let mut request_draft = draft(Some("JD1"), &["SMAW"]);
    request_draft.coupons[0].procedure_ref = None;
    let created = env
        .dal
        .requests()
        .create_with_coupons(request_draft, "WCR")
        .unwrap();
    env.dal.requests().approve(&created.wcr_number, "QA").unwrap();
    env.dal
        .coupons()
        .enter_result(&created.wcr_number, 1, ResultEntry::of(TestResult::Pass))
        .unwrap();

    let issued = env
        .dal
        .qualifications()
        .issue_from_coupon(&created.wcr_number, 1, 6)
        .unwrap();
    assert_eq!(
        issued.wpq_number,
        format!("JD1-{}-C1-SMAW", created.wcr_number)
    );
}

#[test]
fn issuing_without_a_stamp_is_an_error() {
    let env = TestEnv::new();
    let created = env
        .dal
        .requests()
        .create_with_coupons(draft(None, &["SMAW"]), "WCR")
        .unwrap();
    env.dal.requests().approve(&created.wcr_number, "QA").unwrap();
    env.dal
        .coupons()
        .enter_result(&created.wcr_number, 1, ResultEntry::of(TestResult::Pass))
        .unwrap();

    assert!(matches!(
        env.dal.qualifications().issue_from_coupon(&created.wcr_number, 1, 6),
        Err(WorkflowError::MissingStamp { .. })
    ));
}

#[test]
fn qualification_expiration_is_months_of_thirty_days() {
    let env = TestEnv::new();
    let created = env
        .dal
        .requests()
        .create_with_coupons(draft(Some("JD1"), &["SMAW"]), "WCR")
        .unwrap();
    env.dal.requests().approve(&created.wcr_number, "QA").unwrap();

    let test_date = chrono::NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let entry = ResultEntry {
        tested_at: Some(test_date),
        ..ResultEntry::of(TestResult::Pass)
    };
    env.dal.coupons().enter_result(&created.wcr_number, 1, entry).unwrap();

    let issued = env
        .dal
        .qualifications()
        .issue_from_coupon(&created.wcr_number, 1, 6)
        .unwrap();
    assert_eq!(issued.expires_on, test_date + chrono::Duration::days(180));
}

#[test]
fn retest_depth_cap_is_enforced() {
    let env = TestEnv::new();
    let requests = env.dal.requests();
    let coupons = env.dal.coupons();
    let retest = env.dal.retest();

    let created = requests
        .create_with_coupons(draft(Some("JD1"), &["SMAW"]), "WCR")
        .unwrap();
    requests.approve(&created.wcr_number, "QA").unwrap();
    coupons
        .enter_result(&created.wcr_number, 1, ResultEntry::of(TestResult::Fail))
        .unwrap();

    let first = retest
        .schedule_retest(&created.wcr_number, 1, "WCR", Some(1))
        .unwrap();

    requests.approve(&first.retest_wcr_number, "QA").unwrap();
    coupons
        .enter_result(&first.retest_wcr_number, 1, ResultEntry::of(TestResult::Fail))
        .unwrap();

    let second = retest.schedule_retest(&first.retest_wcr_number, 1, "WCR", Some(1));
    assert!(matches!(
        second,
        Err(WorkflowError::RetestDepthExceeded {
            depth: 1,
            max_depth: 1,
            ..
        })
    ));

    // Unbounded scheduling still works at the same depth.
    retest
        .schedule_retest(&first.retest_wcr_number, 1, "WCR", None)
        .unwrap();
}

#[test]
fn retest_requires_a_failed_coupon() {
    let env = TestEnv::new();
    let created = env
        .dal
        .requests()
        .create_with_coupons(draft(Some("JD1"), &["SMAW"]), "WCR")
        .unwrap();

    assert!(matches!(
        env.dal.retest().schedule_retest(&created.wcr_number, 1, "WCR", None),
        Err(WorkflowError::InvalidCouponState { .. })
    ));
}

#[test]
fn missing_entities_are_reported_as_such() {
    let env = TestEnv::new();
    assert!(matches!(
        env.dal.requests().approve("WCR-2020-9999", "QA"),
        Err(WorkflowError::RequestNotFound { .. })
    ));

    let created = env
        .dal
        .requests()
        .create_with_coupons(draft(Some("JD1"), &["SMAW"]), "WCR")
        .unwrap();
    env.dal.requests().approve(&created.wcr_number, "QA").unwrap();
    assert!(matches!(
        env.dal
            .coupons()
            .enter_result(&created.wcr_number, 7, ResultEntry::of(TestResult::Pass)),
        Err(WorkflowError::CouponNotFound { coupon_number: 7, .. })
    ));
}

#[test]
fn list_filters_compose() {
    let env = TestEnv::new();
    let requests = env.dal.requests();

    requests
        .create_with_coupons(draft(Some("JD1"), &["SMAW"]), "WCR")
        .unwrap();
    let mut other = draft(Some("AB2"), &["GTAW"]);
    other.welder_name = "Alex Birch".to_string();
    other.project = Some("P-88".to_string());
    let second = requests.create_with_coupons(other, "WCR").unwrap();
    requests.approve(&second.wcr_number, "QA").unwrap();

    assert_eq!(requests.list(&RequestFilter::default()).unwrap().len(), 2);

    let approved = requests
        .list(&RequestFilter {
            status: Some(RequestStatus::Approved),
            ..RequestFilter::default()
        })
        .unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].wcr_number, second.wcr_number);

    let by_project = requests
        .list(&RequestFilter {
            project: Some("P-88".to_string()),
            ..RequestFilter::default()
        })
        .unwrap();
    assert_eq!(by_project.len(), 1);

    let by_welder = requests
        .list(&RequestFilter {
            welder_contains: Some("Birch".to_string()),
            ..RequestFilter::default()
        })
        .unwrap();
    assert_eq!(by_welder.len(), 1);
    assert_eq!(by_welder[0].welder_name, "Alex Birch");
}

#[test]
fn empty_draft_is_rejected() {
    let env = TestEnv::new();
    let mut empty = draft(Some("JD1"), &[]);
    empty.coupons.clear();
    assert!(matches!(
        env.dal.requests().create_with_coupons(empty, "WCR"),
        Err(WorkflowError::EmptyDraft)
    ));
}

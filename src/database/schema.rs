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

//! Diesel table definitions matching the SQL in `connection.rs`.

diesel::table! {
    processing_log (id) {
        id -> Integer,
        file_name -> Text,
        job_type -> Nullable<Text>,
        status -> Text,
        handler_module -> Nullable<Text>,
        result_summary -> Nullable<Text>,
        error_message -> Nullable<Text>,
        source_payload -> Nullable<Text>,
        content_hash -> Nullable<Text>,
        created_at -> Timestamp,
        completed_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    weld_requests (id) {
        id -> Integer,
        wcr_number -> Text,
        welder_id -> Nullable<Integer>,
        employee_number -> Nullable<Text>,
        welder_name -> Text,
        welder_stamp -> Nullable<Text>,
        project -> Nullable<Text>,
        request_date -> Nullable<Date>,
        submitted_by -> Nullable<Text>,
        source_file -> Nullable<Text>,
        status -> Text,
        is_new_welder -> Bool,
        notes -> Nullable<Text>,
        approved_by -> Nullable<Text>,
        approved_at -> Nullable<Timestamp>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    coupons (id) {
        id -> Integer,
        request_id -> Integer,
        coupon_number -> Integer,
        process -> Text,
        position -> Nullable<Text>,
        procedure_ref -> Nullable<Text>,
        base_material -> Nullable<Text>,
        filler_metal -> Nullable<Text>,
        thickness -> Nullable<Text>,
        diameter -> Nullable<Text>,
        result -> Nullable<Text>,
        status -> Text,
        tested_at -> Nullable<Date>,
        tested_by -> Nullable<Text>,
        visual_result -> Nullable<Text>,
        bend_result -> Nullable<Text>,
        radiograph_result -> Nullable<Text>,
        failure_reason -> Nullable<Text>,
        wpq_id -> Nullable<Integer>,
        retest_wcr_id -> Nullable<Integer>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    qualifications (id) {
        id -> Integer,
        wpq_number -> Text,
        welder_id -> Nullable<Integer>,
        welder_stamp -> Text,
        procedure_ref -> Nullable<Text>,
        process -> Text,
        positions -> Nullable<Text>,
        test_date -> Date,
        initial_expiration -> Date,
        current_expiration -> Date,
        status -> Text,
        notes -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    welders (id) {
        id -> Integer,
        employee_number -> Text,
        first_name -> Text,
        last_name -> Text,
        stamp -> Nullable<Text>,
        active -> Bool,
        created_at -> Timestamp,
    }
}

// `coupons.retest_wcr_id` also points at weld_requests; diesel only allows
// one declared parent, so joins on the retest link are written explicitly.
diesel::joinable!(coupons -> weld_requests (request_id));

diesel::allow_tables_to_appear_in_same_query!(weld_requests, coupons, qualifications);

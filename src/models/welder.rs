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

//! Welder registry rows, used by the bundled `SqliteWelderDirectory` adapter.
//! The workflow engine itself only sees welders through the directory traits.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::database::schema::welders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Welder {
    pub id: i32,
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub stamp: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::database::schema::welders)]
pub struct NewWelder {
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub stamp: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

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

//! Welder resolution against an external registry.
//!
//! The registry is a collaborator, not part of this subsystem: the engine
//! sees it only through [`WelderDirectory`] (lookups) and
//! [`WelderRegistration`] (creation of welders flagged `is_new`).
//! [`SqliteWelderDirectory`] is a bundled adapter over the platform's
//! `welders` table implementing both.
//!
//! [`resolve_welder`] never panics and never propagates raw errors; every
//! failure path comes back as a structured message list, mirroring
//! validation.

use chrono::Utc;
use diesel::prelude::*;
use tracing::info;

use super::payload::WelderPayload;
use crate::database::schema::welders;
use crate::database::Database;
use crate::error::DalError;
use crate::models::{NewWelder, Welder};

/// What the engine needs to know about a welder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelderIdentity {
    pub id: i32,
    pub stamp: Option<String>,
}

/// Read access to the welder registry.
pub trait WelderDirectory: Send + Sync {
    fn find_by_employee_number(
        &self,
        employee_number: &str,
    ) -> Result<Option<WelderIdentity>, DalError>;

    fn find_by_stamp(&self, stamp: &str) -> Result<Option<WelderIdentity>, DalError>;
}

/// Registration of welders not yet in the registry.
pub trait WelderRegistration: Send + Sync {
    fn register(
        &self,
        registration: NewWelderRegistration<'_>,
    ) -> Result<RegistrationOutcome, DalError>;
}

/// A registration request for a new welder.
#[derive(Debug, Clone)]
pub struct NewWelderRegistration<'a> {
    pub employee_number: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub stamp: Option<&'a str>,
    pub auto_assign_stamp: bool,
}

/// The registry's verdict on a registration. A non-empty `errors` list
/// means nothing was created.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub id: i32,
    pub stamp: Option<String>,
    pub errors: Vec<String>,
}

/// A resolved welder, ready for request creation.
#[derive(Debug, Clone)]
pub struct ResolvedWelder {
    pub id: i32,
    pub stamp: Option<String>,
    pub newly_registered: bool,
}

/// Resolves the welder block of a submission.
///
/// Lookup order: employee number, then stamp. An unmatched payload flagged
/// `is_new` with an employee number is delegated to the registration
/// collaborator, splitting the display name on the first whitespace.
pub fn resolve_welder(
    directory: &dyn WelderDirectory,
    registration: &dyn WelderRegistration,
    welder: &WelderPayload,
) -> Result<ResolvedWelder, Vec<String>> {
    let lookup = |target: Result<Option<WelderIdentity>, DalError>| {
        target.map_err(|e| vec![format!("welder lookup failed: {}", e)])
    };

    if let Some(employee_number) = welder.employee_number() {
        if let Some(found) = lookup(directory.find_by_employee_number(employee_number))? {
            return Ok(ResolvedWelder {
                id: found.id,
                stamp: found.stamp,
                newly_registered: false,
            });
        }
    }
    if let Some(stamp) = welder.stamp() {
        if let Some(found) = lookup(directory.find_by_stamp(stamp))? {
            return Ok(ResolvedWelder {
                id: found.id,
                stamp: found.stamp,
                newly_registered: false,
            });
        }
    }

    if !welder.is_new {
        return Err(vec![
            "welder not found in the registry (set is_new to register)".to_string(),
        ]);
    }
    let Some(employee_number) = welder.employee_number() else {
        return Err(vec![
            "a new welder registration requires an employee number".to_string(),
        ]);
    };
    let name = welder.name().unwrap_or_default();
    let (first_name, last_name) = split_display_name(name);

    let outcome = registration
        .register(NewWelderRegistration {
            employee_number,
            first_name,
            last_name,
            stamp: welder.stamp(),
            auto_assign_stamp: welder.stamp().is_none(),
        })
        .map_err(|e| vec![format!("welder registration failed: {}", e)])?;
    if !outcome.errors.is_empty() {
        return Err(outcome.errors);
    }

    info!(employee_number, welder_id = outcome.id, "New welder registered");
    Ok(ResolvedWelder {
        id: outcome.id,
        stamp: outcome.stamp,
        newly_registered: true,
    })
}

/// Splits a display name into (first, last) on the first whitespace run.
fn split_display_name(name: &str) -> (&str, &str) {
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (name, ""),
    }
}

/// Diesel-backed welder registry adapter over the platform's `welders`
/// table.
#[derive(Clone, Debug)]
pub struct SqliteWelderDirectory {
    database: Database,
}

impl SqliteWelderDirectory {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

impl WelderDirectory for SqliteWelderDirectory {
    fn find_by_employee_number(
        &self,
        employee_number: &str,
    ) -> Result<Option<WelderIdentity>, DalError> {
        let mut conn = self.database.conn()?;
        let welder = welders::table
            .filter(welders::employee_number.eq(employee_number))
            .select(Welder::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(welder.map(|w| WelderIdentity {
            id: w.id,
            stamp: w.stamp,
        }))
    }

    fn find_by_stamp(&self, stamp: &str) -> Result<Option<WelderIdentity>, DalError> {
        let mut conn = self.database.conn()?;
        let welder = welders::table
            .filter(welders::stamp.eq(stamp))
            .select(Welder::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(welder.map(|w| WelderIdentity {
            id: w.id,
            stamp: w.stamp,
        }))
    }
}

impl WelderRegistration for SqliteWelderDirectory {
    fn register(
        &self,
        registration: NewWelderRegistration<'_>,
    ) -> Result<RegistrationOutcome, DalError> {
        use diesel::dsl::count_star;

        let mut conn = self.database.conn()?;
        conn.immediate_transaction::<_, DalError, _>(|conn| {
            let taken: i64 = welders::table
                .filter(welders::employee_number.eq(registration.employee_number))
                .select(count_star())
                .first(conn)?;
            if taken > 0 {
                return Ok(RegistrationOutcome {
                    id: 0,
                    stamp: None,
                    errors: vec![format!(
                        "employee number {} is already registered",
                        registration.employee_number
                    )],
                });
            }

            let welder = NewWelder {
                employee_number: registration.employee_number.to_string(),
                first_name: registration.first_name.to_string(),
                last_name: registration.last_name.to_string(),
                stamp: registration.stamp.map(str::to_string),
                active: true,
                created_at: Utc::now().naive_utc(),
            };
            let id: i32 = diesel::insert_into(welders::table)
                .values(&welder)
                .returning(welders::id)
                .get_result(conn)?;

            // Stamps are assigned from the row id, which is unique by
            // construction.
            let stamp = match registration.stamp {
                Some(stamp) => Some(stamp.to_string()),
                None if registration.auto_assign_stamp => {
                    let assigned = format!("W{:03}", id);
                    diesel::update(welders::table.find(id))
                        .set(welders::stamp.eq(Some(assigned.clone())))
                        .execute(conn)?;
                    Some(assigned)
                }
                None => None,
            };

            Ok(RegistrationOutcome {
                id,
                stamp,
                errors: Vec::new(),
            })
        })
    }
}

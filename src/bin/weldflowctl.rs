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

//! weldflowctl: command-line control surface for the weldflow engine.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use weldflow::config::WeldflowConfig;
use weldflow::dal::{RequestFilter, ResultEntry, DAL};
use weldflow::database::Database;
use weldflow::dispatcher::{HandlerRegistry, JobDispatcher, JobOutcome};
use weldflow::intake::{CertificationRequestHandler, SqliteWelderDirectory};
use weldflow::workflow::status::TestResult;

#[derive(Parser)]
#[command(name = "weldflowctl", about = "Weld certification workflow control", version)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true, default_value = "weldflow.db", env = "WELDFLOW_DB")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the incoming directory and process every job file
    Process {
        /// Process a single file instead of scanning
        #[arg(long)]
        file: Option<PathBuf>,

        /// Report what would happen without changing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// List certification requests
    List {
        /// Filter by request status
        #[arg(long)]
        status: Option<String>,

        /// Filter by exact project reference
        #[arg(long)]
        project: Option<String>,

        /// Filter by welder-name substring
        #[arg(long)]
        welder: Option<String>,
    },
    /// Show one request and its coupons
    Show { wcr_number: String },
    /// Approve a pending request
    Approve {
        wcr_number: String,

        /// Name of the approver, recorded on the request
        #[arg(long = "by")]
        approved_by: String,
    },
    /// Record a test result for a coupon
    Result {
        wcr_number: String,
        coupon_number: i32,
        verdict: Verdict,

        #[arg(long)]
        tested_by: Option<String>,

        /// Test date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        tested_at: Option<chrono::NaiveDate>,

        #[arg(long)]
        visual: Option<String>,

        #[arg(long)]
        bend: Option<String>,

        #[arg(long)]
        radiograph: Option<String>,

        /// Failure reason, for failed coupons
        #[arg(long)]
        reason: Option<String>,
    },
    /// Issue a qualification from a passed coupon
    Issue {
        wcr_number: String,
        coupon_number: i32,

        /// Validity window in months; defaults to the configured window
        #[arg(long)]
        months: Option<u32>,
    },
    /// Schedule a retest for a failed coupon
    Retest {
        wcr_number: String,
        coupon_number: i32,
    },
    /// Cancel a request
    Cancel { wcr_number: String },
    /// Show recent audit-log entries
    Log {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Verdict {
    Pass,
    Fail,
}

impl From<Verdict> for TestResult {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Pass => TestResult::Pass,
            Verdict::Fail => TestResult::Fail,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => WeldflowConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WeldflowConfig::default(),
    };

    let database = Database::new(
        cli.database.to_str().context("database path is not UTF-8")?,
        config.db_pool_size,
    )?;
    let dal = Arc::new(DAL::new(database.clone()));

    match cli.command {
        Commands::Process { file, dry_run } => {
            let welders = Arc::new(SqliteWelderDirectory::new(database));
            let mut registry = HandlerRegistry::new();
            registry.register(Arc::new(CertificationRequestHandler::new(
                dal.clone(),
                welders.clone(),
                welders,
                config.clone(),
            )))?;
            let dispatcher = JobDispatcher::new(dal, Arc::new(registry), &config);

            match file {
                Some(path) => match dispatcher.process_one(&path, dry_run)? {
                    JobOutcome::Handled { summary, .. } => println!("{}", summary),
                    JobOutcome::Duplicate { job_type } => {
                        println!("duplicate {} payload, suppressed", job_type)
                    }
                    JobOutcome::Failed { error, .. } => println!("failed: {}", error),
                    JobOutcome::DryRun { report } => println!("{}", report),
                },
                None => {
                    let summary = dispatcher.process_all()?;
                    println!(
                        "scanned {}, succeeded {}, failed {}, duplicates {}",
                        summary.scanned, summary.succeeded, summary.failed, summary.duplicates
                    );
                }
            }
        }
        Commands::List {
            status,
            project,
            welder,
        } => {
            let filter = RequestFilter {
                status: status
                    .map(|s| s.parse().map_err(anyhow::Error::from))
                    .transpose()?,
                project,
                welder_contains: welder,
            };
            for request in dal.requests().list(&filter)? {
                println!(
                    "{}  {:20}  {}  {}",
                    request.wcr_number,
                    request.status,
                    request.welder_name,
                    request.project.as_deref().unwrap_or("-")
                );
            }
        }
        Commands::Show { wcr_number } => {
            let Some((request, coupons)) = dal.requests().get_with_coupons(&wcr_number)? else {
                anyhow::bail!("request {} not found", wcr_number);
            };
            println!("{}  [{}]", request.wcr_number, request.status);
            println!(
                "  welder: {} (stamp {})",
                request.welder_name,
                request.welder_stamp.as_deref().unwrap_or("-")
            );
            if let Some(project) = &request.project {
                println!("  project: {}", project);
            }
            if let Some(approver) = &request.approved_by {
                println!("  approved by: {}", approver);
            }
            if let Some(notes) = &request.notes {
                println!("  notes: {}", notes);
            }
            for coupon in coupons {
                println!(
                    "  coupon {}: {} {}  [{}]{}",
                    coupon.coupon_number,
                    coupon.process,
                    coupon.position.as_deref().unwrap_or("-"),
                    coupon.status,
                    coupon
                        .result
                        .as_deref()
                        .map(|r| format!("  result={}", r))
                        .unwrap_or_default()
                );
            }
        }
        Commands::Approve {
            wcr_number,
            approved_by,
        } => {
            let request = dal.requests().approve(&wcr_number, &approved_by)?;
            println!("{} approved, status {}", request.wcr_number, request.status);
        }
        Commands::Result {
            wcr_number,
            coupon_number,
            verdict,
            tested_by,
            tested_at,
            visual,
            bend,
            radiograph,
            reason,
        } => {
            let entry = ResultEntry {
                result: verdict.into(),
                tested_by,
                tested_at,
                visual_result: visual,
                bend_result: bend,
                radiograph_result: radiograph,
                failure_reason: reason,
            };
            let recorded = dal.coupons().enter_result(&wcr_number, coupon_number, entry)?;
            println!(
                "coupon {} -> {}, request -> {}",
                coupon_number, recorded.coupon_status, recorded.request_status
            );
        }
        Commands::Issue {
            wcr_number,
            coupon_number,
            months,
        } => {
            let issued = dal.qualifications().issue_from_coupon(
                &wcr_number,
                coupon_number,
                months.unwrap_or(config.default_wpq_expiration_months),
            )?;
            println!(
                "issued {} (expires {}), request -> {}",
                issued.wpq_number, issued.expires_on, issued.request_status
            );
        }
        Commands::Retest {
            wcr_number,
            coupon_number,
        } => {
            let scheduled =
                dal.retest()
                    .schedule_retest(&wcr_number, coupon_number, &config.wcr_prefix, config.max_retest_depth)?;
            println!(
                "retest scheduled as {}, original request -> {}",
                scheduled.retest_wcr_number, scheduled.original_request_status
            );
        }
        Commands::Cancel { wcr_number } => {
            let request = dal.requests().cancel(&wcr_number)?;
            println!("{} cancelled", request.wcr_number);
        }
        Commands::Log { limit } => {
            for entry in dal.processing_log().recent(limit)? {
                println!(
                    "{}  {:10}  {}  {}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.status,
                    entry.file_name,
                    entry
                        .result_summary
                        .as_deref()
                        .or(entry.error_message.as_deref())
                        .unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

//! Command line front end for the HR engine.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hr_engine::config::ConfigLoader;
use hr_engine::models::{EmployeeFilter, EmployeeStatus, LeaveStatus, NewEmployee, NewLeaveRequest};
use hr_engine::scheduler::{AlertScheduler, TracingNotifier};
use hr_engine::services;
use hr_engine::store::{Database, SOURCE_MANUAL};

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "hr-engine")]
#[command(about = "Employees, attendance, leave and payroll on SQLite")]
struct Cli {
    /// YAML configuration file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "config/hr.yaml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and seed settings.
    Init,
    Employee {
        #[command(subcommand)]
        command: EmployeeCommand,
    },
    Department {
        #[command(subcommand)]
        command: DepartmentCommand,
    },
    ClockIn {
        employee_id: String,
        /// Defaults to now.
        #[arg(long)]
        at: Option<NaiveDateTime>,
        #[arg(long)]
        notes: Option<String>,
    },
    ClockOut {
        employee_id: String,
        #[arg(long)]
        at: Option<NaiveDateTime>,
    },
    /// Today's attendance status of an employee.
    Status { employee_id: String },
    Leave {
        #[command(subcommand)]
        command: LeaveCommand,
    },
    Payroll {
        #[command(subcommand)]
        command: PayrollCommand,
    },
    /// Archive employees terminated on or before a date.
    Archive { cutoff: String },
    /// Move every active employee to the next shift.
    RotateShifts,
    /// HR alerts report over a period.
    Alerts {
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Import a fingerprint terminal CSV export.
    ImportFingerprints { path: PathBuf },
    /// Run the alert scheduler until interrupted.
    Watch,
}

#[derive(Subcommand)]
enum EmployeeCommand {
    Add {
        name: String,
        #[arg(long)]
        salary: Decimal,
        #[arg(long)]
        department_id: Option<i64>,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        device_user_id: Option<String>,
        #[arg(long)]
        manager_id: Option<String>,
    },
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        department_id: Option<i64>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value_t = false)]
        include_archived: bool,
    },
    Show { employee_id: String },
    Terminate {
        employee_id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum DepartmentCommand {
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    List,
}

#[derive(Subcommand)]
enum LeaveCommand {
    Request {
        employee_id: String,
        leave_type: String,
        start: NaiveDate,
        end: NaiveDate,
        #[arg(long)]
        reason: Option<String>,
    },
    Approve {
        request_id: i64,
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        comments: Option<String>,
    },
    Reject {
        request_id: i64,
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        comments: Option<String>,
    },
}

#[derive(Subcommand)]
enum PayrollCommand {
    /// Calculate without saving.
    Preview {
        employee_id: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    Generate {
        employee_id: String,
        start: NaiveDate,
        end: NaiveDate,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Generate payslips for every active employee.
    Run { start: NaiveDate, end: NaiveDate },
}

fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> ExitCode {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hr_engine=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult {
    let loader = ConfigLoader::load_or_default(&cli.config)?;
    let db = Database::open(&loader.config().database.path, loader.policy())?;

    match cli.command {
        Command::Init => {
            println!("database ready at {}", loader.config().database.path);
        }
        Command::Employee { command } => employee(&db, command)?,
        Command::Department { command } => match command {
            DepartmentCommand::Add { name, description } => {
                let id = db.add_department(&name, description.as_deref())?;
                println!("department {id} created");
            }
            DepartmentCommand::List => print_json(&db.list_departments()?)?,
        },
        Command::ClockIn {
            employee_id,
            at,
            notes,
        } => {
            let id = db.clock_in(&employee_id, at.unwrap_or_else(now), SOURCE_MANUAL, notes.as_deref())?;
            println!("clocked in (log {id})");
        }
        Command::ClockOut { employee_id, at } => {
            let log = db.clock_out(&employee_id, at.unwrap_or_else(now))?;
            print_json(&log)?;
        }
        Command::Status { employee_id } => {
            let status = services::attendance_status_today(&db, &employee_id, now())?;
            println!("{}", status.message);
        }
        Command::Leave { command } => leave(&db, command)?,
        Command::Payroll { command } => payroll(&db, command)?,
        Command::Archive { cutoff } => {
            let archived = db.archive_terminated_employees(&cutoff)?;
            println!("{archived} employee(s) archived");
        }
        Command::RotateShifts => {
            let rotated = db.rotate_shifts()?;
            println!("{rotated} employee(s) moved to the next shift");
        }
        Command::Alerts { start, end } => {
            print_json(&services::generate_hr_alerts_report(&db, start, end, None)?)?;
        }
        Command::ImportFingerprints { path } => {
            print_json(&services::import_fingerprint_csv(&db, &path)?)?;
        }
        Command::Watch => watch_alerts(db)?,
    }
    Ok(())
}

fn employee(db: &Database, command: EmployeeCommand) -> CliResult {
    match command {
        EmployeeCommand::Add {
            name,
            salary,
            department_id,
            position,
            start_date,
            email,
            phone,
            device_user_id,
            manager_id,
        } => {
            let new = NewEmployee {
                department_id,
                position,
                start_date,
                email,
                phone,
                device_user_id,
                manager_id,
                ..NewEmployee::new(&name, salary)
            };
            let id = db.add_employee(&new)?;
            println!("{id}");
        }
        EmployeeCommand::List {
            status,
            department_id,
            name,
            include_archived,
        } => {
            let filter = EmployeeFilter {
                status: status.as_deref().map(str::parse::<EmployeeStatus>).transpose()?,
                department_id,
                name_contains: name,
                include_archived,
            };
            print_json(&db.list_employees(&filter)?)?;
        }
        EmployeeCommand::Show { employee_id } => {
            print_json(&db.get_employee(&employee_id, true)?)?;
        }
        EmployeeCommand::Terminate { employee_id, date } => {
            let date = date.unwrap_or_else(|| now().date());
            db.set_status(&employee_id, EmployeeStatus::Terminated, date)?;
            db.log_action(&employee_id, &format!("Terminated effective {date}"), None)?;
            println!("{employee_id} terminated");
        }
    }
    Ok(())
}

fn leave(db: &Database, command: LeaveCommand) -> CliResult {
    match command {
        LeaveCommand::Request {
            employee_id,
            leave_type,
            start,
            end,
            reason,
        } => {
            let outcome = services::request_leave(
                db,
                &NewLeaveRequest {
                    employee_id,
                    leave_type,
                    start_date: start,
                    end_date: end,
                    reason,
                },
            )?;
            if outcome.department_busy() {
                println!("warning: department is busy over these dates");
            }
            print_json(&outcome)?;
        }
        LeaveCommand::Approve {
            request_id,
            user_id,
            comments,
        } => {
            let request =
                db.process_leave_request(request_id, LeaveStatus::Approved, user_id, comments.as_deref())?;
            print_json(&request)?;
        }
        LeaveCommand::Reject {
            request_id,
            user_id,
            comments,
        } => {
            let request =
                db.process_leave_request(request_id, LeaveStatus::Rejected, user_id, comments.as_deref())?;
            print_json(&request)?;
        }
    }
    Ok(())
}

fn payroll(db: &Database, command: PayrollCommand) -> CliResult {
    match command {
        PayrollCommand::Preview {
            employee_id,
            start,
            end,
        } => print_json(&services::calculate_payroll_for_employee(db, &employee_id, start, end)?),
        PayrollCommand::Generate {
            employee_id,
            start,
            end,
            notes,
        } => {
            let (payslip_id, result) =
                services::generate_payslip(db, &employee_id, start, end, notes.as_deref())?;
            println!("payslip {payslip_id}, net pay {}", result.totals.net_pay);
            Ok(())
        }
        PayrollCommand::Run { start, end } => print_json(&services::run_payroll(db, start, end)?),
    }
}

fn watch_alerts(db: Database) -> CliResult {
    let poll = Duration::from_secs(db.load_policy()?.alerts.poll_interval_secs.max(1));
    let scheduler = Arc::new(AlertScheduler::new(
        Arc::new(Mutex::new(db)),
        Arc::new(TracingNotifier),
    ));
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(scheduler.run(poll, shutdown_rx));
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "could not listen for ctrl-c");
        }
        info!("shutting down");
        let _ = shutdown_tx.send(true);
        task.await
    })?;
    Ok(())
}

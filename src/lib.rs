//! Human resources engine.
//!
//! This crate keeps employee records, attendance logs, leave requests,
//! payslips, contracts and evaluations in a SQLite database, and provides
//! the business rules that sit on top of them: payroll calculation,
//! lateness and attendance status, vacation balances, and HR alerts.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod store;

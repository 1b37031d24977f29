//! Performance benchmarks for the HR engine.
//!
//! Covers the hot paths of a payroll run:
//! - Payslip calculation for one employee over a month
//! - Fingerprint export parsing and daily summaries
//! - A full calculation pass over 100 stored employees
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use chrono::{Duration, NaiveDate};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use hr_engine::calculation::{PayrollInput, calculate_payslip, daily_event_summary, parse_fingerprint_csv};
use hr_engine::config::Policy;
use hr_engine::models::{AttendanceLog, NewEmployee, PayItem, PayItemKind};
use hr_engine::services::calculate_payroll_for_employee;
use hr_engine::store::{Database, SOURCE_MANUAL};

fn month_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

/// Logs for the first `days` days of March, 08:30 to 17:45.
fn create_logs(days: i64) -> Vec<AttendanceLog> {
    (0..days)
        .map(|i| {
            let day = month_start() + Duration::days(i);
            AttendanceLog {
                id: i,
                employee_id: "EMP0001".to_string(),
                clock_in: day.and_hms_opt(8, 30, 0).unwrap(),
                clock_out: Some(day.and_hms_opt(17, 45, 0).unwrap()),
                log_date: day,
                source: SOURCE_MANUAL.to_string(),
                notes: None,
            }
        })
        .collect()
}

fn create_pay_items() -> Vec<PayItem> {
    [("Housing", PayItemKind::Allowance, 300), ("Insurance", PayItemKind::Deduction, 80)]
        .into_iter()
        .enumerate()
        .map(|(i, (name, kind, amount))| PayItem {
            id: i as i64,
            employee_id: "EMP0001".to_string(),
            kind,
            item_type: name.to_string(),
            amount: Decimal::from(amount),
            is_recurring: true,
            effective_date: month_start(),
            end_date: None,
        })
        .collect()
}

fn bench_payslip_by_log_count(c: &mut Criterion) {
    let policy = Policy::default();
    let items = create_pay_items();
    let end = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();

    let mut group = c.benchmark_group("payslip");
    for days in [1i64, 10, 31] {
        let logs = create_logs(days);
        group.bench_with_input(BenchmarkId::from_parameter(days), &logs, |b, logs| {
            b.iter(|| {
                calculate_payslip(black_box(&PayrollInput {
                    employee_id: "EMP0001",
                    salary: Decimal::from(4200),
                    period_start: month_start(),
                    period_end: end,
                    logs,
                    pay_items: &items,
                    advance: None,
                    policy: &policy,
                }))
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_fingerprint_export(c: &mut Criterion) {
    let mut export = String::from("Employee ID,Timestamp,Event Code\n");
    for user in 0..50 {
        for day in 0..20 {
            let date = month_start() + Duration::days(day);
            for (time, code) in [("08:55:00", 0), ("12:00:00", 2), ("12:45:00", 3), ("17:10:00", 1)] {
                export.push_str(&format!("{user},{date} {time},{code}\n"));
            }
        }
    }

    let mut group = c.benchmark_group("fingerprint");
    group.throughput(Throughput::Elements(50 * 20 * 4));
    group.bench_function("parse_and_summarize_4000_events", |b| {
        b.iter(|| {
            let parsed = parse_fingerprint_csv(black_box(export.as_bytes()), "bench").unwrap();
            daily_event_summary(&parsed.events)
        })
    });
    group.finish();
}

fn bench_payroll_pass_100(c: &mut Criterion) {
    let db = Database::open_in_memory(Policy::default()).unwrap();
    let ids: Vec<String> = (0..100)
        .map(|i| {
            let id = db
                .add_employee(&NewEmployee::new(&format!("Employee {i}"), Decimal::from(3000 + i)))
                .unwrap();
            for log in create_logs(20) {
                db.insert_log(&id, log.clock_in, log.clock_out, SOURCE_MANUAL, None)
                    .unwrap();
            }
            id
        })
        .collect();
    let end = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();

    let mut group = c.benchmark_group("payroll_pass");
    group.throughput(Throughput::Elements(100));
    group.sample_size(20);
    group.bench_function("calculate_100_employees", |b| {
        b.iter(|| {
            for id in &ids {
                black_box(calculate_payroll_for_employee(&db, id, month_start(), end).unwrap());
            }
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_payslip_by_log_count,
    bench_fingerprint_export,
    bench_payroll_pass_100
);
criterion_main!(benches);

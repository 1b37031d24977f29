//! Background alert scheduler.
//!
//! [`AlertScheduler`] wakes on a fixed interval and runs the daily absence
//! and lateness checks and the weekly statistics. Each check runs at most
//! once per period; the scheduler remembers the last day it fired. Work
//! runs on a blocking thread because the database handle is synchronous.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::error::{HrError, HrResult};
use crate::models::Notification;
use crate::services::{absent_employees_for_alert, repeated_lateness_alerts, weekly_statistics};
use crate::store::Database;

/// Receives notifications produced by the scheduler.
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    fn notify(&self, notification: &Notification) -> HrResult<()>;
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) -> HrResult<()> {
        info!(
            category = %notification.category,
            subject = %notification.subject,
            body = %notification.body,
            "notification"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct FiredOn {
    absence: Option<NaiveDate>,
    lateness: Option<NaiveDate>,
    weekly: Option<NaiveDate>,
}

/// Runs the periodic HR checks.
pub struct AlertScheduler {
    db: Arc<Mutex<Database>>,
    notifier: Arc<dyn Notifier>,
    fired: Mutex<FiredOn>,
}

impl AlertScheduler {
    /// Creates a scheduler over a shared database.
    pub fn new(db: Arc<Mutex<Database>>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            notifier,
            fired: Mutex::new(FiredOn::default()),
        }
    }

    fn send(&self, category: &str, subject: String, body: String) -> HrResult<()> {
        self.notifier.notify(&Notification {
            category: category.to_string(),
            subject,
            body,
        })
    }

    /// Runs whatever checks are due at `now` and returns how many
    /// notifications were sent.
    pub fn tick(&self, now: NaiveDateTime) -> HrResult<usize> {
        let db = self.db.lock().map_err(|_| HrError::Database {
            message: "database lock poisoned".to_string(),
        })?;
        let mut fired = self.fired.lock().map_err(|_| HrError::Database {
            message: "scheduler state lock poisoned".to_string(),
        })?;
        let policy = db.load_policy()?;
        let today = now.date();
        let mut sent = 0;

        if policy.alerts.enable_absence_alert
            && fired.absence != Some(today)
            && now.time() >= policy.alerts.absence_alert_cutoff_time
        {
            let absent = absent_employees_for_alert(&db, now)?;
            fired.absence = Some(today);
            if !absent.is_empty() {
                let names: Vec<&str> = absent.iter().map(|e| e.name.as_str()).collect();
                self.send(
                    "absence_alert",
                    format!("{} employee(s) not clocked in on {}", absent.len(), today),
                    names.join("\n"),
                )?;
                sent += 1;
            }
        }

        if policy.alerts.enable_repeated_lateness_alert && fired.lateness != Some(today) {
            let late = repeated_lateness_alerts(&db, today)?;
            fired.lateness = Some(today);
            if !late.is_empty() {
                let lines: Vec<String> = late
                    .iter()
                    .map(|(e, n)| format!("{} ({}): {} late arrivals", e.name, e.id, n))
                    .collect();
                self.send(
                    "lateness_alert",
                    format!(
                        "Repeated lateness in the last {} days",
                        policy.alerts.lateness_alert_period_days
                    ),
                    lines.join("\n"),
                )?;
                sent += 1;
            }
        }

        if policy.alerts.weekly_stats_enabled
            && today.weekday() == policy.alerts.weekly_stats_day
            && now.time() >= policy.alerts.weekly_stats_time
            && fired.weekly != Some(today)
        {
            let stats = weekly_statistics(&db, today.pred_opt().unwrap_or(today))?;
            fired.weekly = Some(today);
            self.send(
                "weekly_statistics",
                format!("Weekly attendance statistics to {}", stats.week_end),
                stats.to_message(),
            )?;
            sent += 1;
        }

        debug!(%now, sent, "scheduler tick");
        Ok(sent)
    }

    /// Ticks every `poll_interval` until `shutdown` turns true.
    pub async fn run(self: Arc<Self>, poll_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(poll_interval);
        info!(poll_secs = poll_interval.as_secs(), "alert scheduler started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let scheduler = Arc::clone(&self);
                    let now = Local::now().naive_local();
                    match tokio::task::spawn_blocking(move || scheduler.tick(now)).await {
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => error!(error = %e, "scheduler tick failed"),
                        Err(e) => error!(error = %e, "scheduler task panicked"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("alert scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SOURCE_MANUAL, test_support};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notification>>);

    impl Notifier for Recorder {
        fn notify(&self, notification: &Notification) -> HrResult<()> {
            self.0.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn setup() -> (Arc<Recorder>, AlertScheduler, String) {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        let recorder = Arc::new(Recorder::default());
        let scheduler = AlertScheduler::new(Arc::new(Mutex::new(db)), recorder.clone());
        (recorder, scheduler, emp)
    }

    #[test]
    fn test_absence_alert_fires_once_after_cutoff() {
        let (recorder, scheduler, _) = setup();
        // Tuesday 4 March
        assert_eq!(scheduler.tick(at(4, 9, 0)).unwrap(), 0);
        assert_eq!(scheduler.tick(at(4, 10, 0)).unwrap(), 1);
        assert_eq!(scheduler.tick(at(4, 11, 0)).unwrap(), 0);

        let sent = recorder.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].category, "absence_alert");
        assert!(sent[0].body.contains("Ana"));
    }

    #[test]
    fn test_weekly_statistics_on_configured_day() {
        let (recorder, scheduler, emp) = setup();
        scheduler
            .db
            .lock()
            .unwrap()
            .insert_log(&emp, at(3, 9, 0), Some(at(3, 17, 0)), SOURCE_MANUAL, None)
            .unwrap();
        // Monday 10 March, before the absence cutoff.
        assert_eq!(scheduler.tick(at(10, 8, 30)).unwrap(), 1);
        let sent = recorder.0.lock().unwrap();
        assert_eq!(sent[0].category, "weekly_statistics");
        assert!(sent[0].body.contains("Hours worked: 8"));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (_, scheduler, _) = setup();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(Arc::new(scheduler).run(Duration::from_secs(3600), rx));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}

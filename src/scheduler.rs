use crate::logi;
use crate::pipeline::Agent;
use anyhow::Result;
use chrono::{Datelike, Duration, Local, NaiveDateTime, NaiveTime, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    DailyCycle,
    Analytics,
    WeeklyReport,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    pub daily_at: NaiveTime,
    pub analytics_every: Duration,
    pub report_on: Weekday,
    pub report_at: NaiveTime,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            daily_at: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default(),
            analytics_every: Duration::hours(6),
            report_on: Weekday::Mon,
            report_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
        }
    }
}

/// First occurrence of `at` strictly after `now`.
pub fn next_daily(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// First `weekday` at `at` strictly after `now`.
pub fn next_weekly(now: NaiveDateTime, weekday: Weekday, at: NaiveTime) -> NaiveDateTime {
    let ahead = (7 + weekday.num_days_from_monday() - now.weekday().num_days_from_monday()) % 7;
    let candidate = (now.date() + Duration::days(i64::from(ahead))).and_time(at);
    if candidate > now {
        candidate
    } else {
        candidate + Duration::days(7)
    }
}

/// Next due time of every job, in local wall-clock time.
#[derive(Debug, Clone)]
pub struct Plan {
    schedule: Schedule,
    due: Vec<(Job, NaiveDateTime)>,
}

impl Plan {
    pub fn new(schedule: Schedule, now: NaiveDateTime) -> Self {
        let due = vec![
            (Job::DailyCycle, next_daily(now, schedule.daily_at)),
            (Job::Analytics, now + schedule.analytics_every),
            (
                Job::WeeklyReport,
                next_weekly(now, schedule.report_on, schedule.report_at),
            ),
        ];
        Self { schedule, due }
    }

    /// Earliest pending job. Ties go to the job listed first.
    pub fn next_due(&self) -> (Job, NaiveDateTime) {
        let mut best = self.due[0];
        for &(job, at) in &self.due[1..] {
            if at < best.1 {
                best = (job, at);
            }
        }
        best
    }

    /// Reschedule `job` after it ran at `now`.
    pub fn advance(&mut self, job: Job, now: NaiveDateTime) {
        let next = match job {
            Job::DailyCycle => next_daily(now, self.schedule.daily_at),
            Job::Analytics => now + self.schedule.analytics_every,
            Job::WeeklyReport => next_weekly(now, self.schedule.report_on, self.schedule.report_at),
        };
        for entry in &mut self.due {
            if entry.0 == job {
                entry.1 = next;
            }
        }
    }
}

async fn run_job(agent: &Agent, job: Job) {
    let outcome = match job {
        Job::DailyCycle => agent.run_cycle().await.map(|_| ()),
        Job::Analytics => agent.update_analytics().await.map(|_| ()),
        Job::WeeklyReport => agent.report().await.map(|_| ()),
    };
    if let Err(e) = outcome {
        tracing::error!(job = ?job, error = %format!("{e:#}"), "scheduled job failed");
    }
}

/// Run the agent on its schedule until Ctrl+C.
pub async fn run(agent: &Agent, schedule: Schedule) -> Result<()> {
    let mut plan = Plan::new(schedule, Local::now().naive_local());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let (job, at) = plan.next_due();
        let wait = (at - Local::now().naive_local())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        logi(format!("Next job {job:?} at {at}"));

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = &mut shutdown => break,
        }
        tokio::select! {
            _ = run_job(agent, job) => {}
            _ = &mut shutdown => break,
        }
        plan.advance(job, Local::now().naive_local());
    }

    logi("Scheduler stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn six() -> NaiveTime {
        NaiveTime::from_hms_opt(6, 0, 0).unwrap()
    }

    #[test]
    fn daily_job_runs_today_or_tomorrow() {
        assert_eq!(next_daily(at(2024, 3, 5, 5, 59), six()), at(2024, 3, 5, 6, 0));
        assert_eq!(next_daily(at(2024, 3, 5, 6, 0), six()), at(2024, 3, 6, 6, 0));
        assert_eq!(next_daily(at(2024, 3, 31, 23, 0), six()), at(2024, 4, 1, 6, 0));
    }

    #[test]
    fn weekly_job_lands_on_the_next_monday() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        // 2024-03-04 is a Monday.
        assert_eq!(next_weekly(at(2024, 3, 4, 8, 0), Weekday::Mon, nine), at(2024, 3, 4, 9, 0));
        assert_eq!(next_weekly(at(2024, 3, 4, 9, 30), Weekday::Mon, nine), at(2024, 3, 11, 9, 0));
        assert_eq!(next_weekly(at(2024, 3, 7, 12, 0), Weekday::Mon, nine), at(2024, 3, 11, 9, 0));
    }

    #[test]
    fn plan_orders_jobs_and_reschedules() {
        // Monday 01:00: analytics at 07:00, daily at 06:00, report at 09:00.
        let now = at(2024, 3, 4, 1, 0);
        let mut plan = Plan::new(Schedule::default(), now);
        assert_eq!(plan.next_due(), (Job::DailyCycle, at(2024, 3, 4, 6, 0)));

        plan.advance(Job::DailyCycle, at(2024, 3, 4, 6, 30));
        assert_eq!(plan.next_due(), (Job::Analytics, at(2024, 3, 4, 7, 0)));

        plan.advance(Job::Analytics, at(2024, 3, 4, 7, 0));
        assert_eq!(plan.next_due(), (Job::WeeklyReport, at(2024, 3, 4, 9, 0)));
    }
}

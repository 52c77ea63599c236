use super::*;
use chrono::TimeZone;
use streamlapse_config::ScheduleEntry;

use crate::job::{JobKind, HEARTBEAT_JOB_ID, HOUSEKEEPING_JOB_ID};

#[derive(Default)]
struct RecordingHandler {
    runs: Mutex<Vec<(String, JobKind, DateTime<Local>)>>,
}

impl RecordingHandler {
    fn ids(&self) -> Vec<String> {
        self.runs.lock().iter().map(|(id, _, _)| id.clone()).collect()
    }
}

#[async_trait]
impl JobHandler for RecordingHandler {
    async fn run_job(&self, job: CronJob, _config: Arc<Config>, scheduled_for: DateTime<Local>) {
        self.runs
            .lock()
            .push((job.id().to_string(), job.kind(), scheduled_for));
    }
}

struct PanickingHandler {
    calls: Mutex<u32>,
}

#[async_trait]
impl JobHandler for PanickingHandler {
    async fn run_job(&self, _job: CronJob, _config: Arc<Config>, _at: DateTime<Local>) {
        *self.calls.lock() += 1;
        panic!("job exploded");
    }
}

fn local(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(y, m, d, hh, mm, ss).unwrap()
}

/// Config whose only jobs are the given captures.
fn captures_only(schedules: Vec<ScheduleEntry>) -> Arc<Config> {
    let mut config = Config {
        schedules,
        ..Config::default()
    };
    config.housekeeping.cron = "0 0 1 1 *".to_string();
    config.daemon.heartbeat_cron = String::new();
    Arc::new(config)
}

async fn wait_for_runs(handler: &RecordingHandler, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while handler.runs.lock().len() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("handler was not called in time");
}

#[tokio::test]
async fn test_new_scheduler_has_deadline() {
    let handler = Arc::new(RecordingHandler::default());
    let scheduler = CronScheduler::new(Arc::new(Config::default()), handler);
    assert!(scheduler.next_fire().is_some());
    assert_eq!(scheduler.jobs().len(), 7);
}

#[tokio::test]
async fn test_rearm_at_picks_earliest_occurrence() {
    let handler = Arc::new(RecordingHandler::default());
    let config = captures_only(vec![ScheduleEntry::new("cap_evening", "0 18-23 * * *")]);
    let scheduler = CronScheduler::new(config, handler);

    let next = scheduler.rearm_at(local(2024, 6, 15, 17, 59, 56));
    assert_eq!(next, Some(local(2024, 6, 15, 18, 0, 0)));
    assert_eq!(scheduler.next_fire(), next);
}

#[tokio::test]
async fn test_tick_dispatches_due_job() {
    let handler = Arc::new(RecordingHandler::default());
    let config = captures_only(vec![ScheduleEntry::new("cap_evening", "0 18-23 * * *")]);
    let scheduler = CronScheduler::new(config, handler.clone());

    let fired = scheduler.tick(local(2024, 6, 15, 18, 0, 1));
    assert_eq!(fired, vec!["cap_evening".to_string()]);

    wait_for_runs(&handler, 1).await;
    let runs = handler.runs.lock().clone();
    assert_eq!(runs[0].1, JobKind::Capture);
    assert_eq!(runs[0].2, local(2024, 6, 15, 18, 0, 0));
    assert_eq!(scheduler.next_fire(), Some(local(2024, 6, 15, 19, 0, 0)));
}

#[tokio::test]
async fn test_tick_does_not_dispatch_occurrence_twice() {
    let handler = Arc::new(RecordingHandler::default());
    let config = captures_only(vec![ScheduleEntry::new("cap_evening", "0 18-23 * * *")]);
    let scheduler = CronScheduler::new(config, handler.clone());

    assert_eq!(scheduler.tick(local(2024, 6, 15, 18, 0, 1)).len(), 1);
    assert!(scheduler.tick(local(2024, 6, 15, 18, 0, 3)).is_empty());
    assert_eq!(scheduler.tick(local(2024, 6, 15, 19, 0, 0)).len(), 1);

    wait_for_runs(&handler, 2).await;
}

#[tokio::test]
async fn test_tick_outside_grace_dispatches_nothing() {
    let handler = Arc::new(RecordingHandler::default());
    let config = captures_only(vec![ScheduleEntry::new("cap_evening", "0 18-23 * * *")]);
    let scheduler = CronScheduler::new(config, handler.clone());

    assert!(scheduler.tick(local(2024, 6, 15, 18, 0, 30)).is_empty());
    assert!(handler.ids().is_empty());
}

#[tokio::test]
async fn test_late_wakeup_still_dispatches_armed_occurrence() {
    let handler = Arc::new(RecordingHandler::default());
    let config = captures_only(vec![ScheduleEntry::new("cap_evening", "0 18-23 * * *")]);
    let scheduler = CronScheduler::new(config, handler.clone());

    let armed = scheduler.rearm_at(local(2024, 6, 15, 17, 59, 56));
    assert_eq!(armed, Some(local(2024, 6, 15, 18, 0, 0)));

    let fired = scheduler.tick(local(2024, 6, 15, 18, 0, 10));
    assert_eq!(fired, vec!["cap_evening".to_string()]);
    wait_for_runs(&handler, 1).await;
    assert_eq!(handler.runs.lock()[0].2, local(2024, 6, 15, 18, 0, 0));
    assert_eq!(scheduler.next_fire(), Some(local(2024, 6, 15, 19, 0, 0)));

    // A second wake-up for the same slot stays quiet.
    assert!(scheduler.tick(local(2024, 6, 15, 18, 0, 20)).is_empty());
}

#[tokio::test]
async fn test_long_suspend_coalesces_missed_occurrences() {
    let handler = Arc::new(RecordingHandler::default());
    let config = captures_only(vec![ScheduleEntry::new("cap_evening", "0 18-23 * * *")]);
    let scheduler = CronScheduler::new(config, handler.clone());

    scheduler.rearm_at(local(2024, 6, 15, 17, 59, 56));
    let fired = scheduler.tick(local(2024, 6, 15, 20, 30, 0));
    assert_eq!(fired, vec!["cap_evening".to_string()]);

    wait_for_runs(&handler, 1).await;
    let runs = handler.runs.lock().clone();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].2, local(2024, 6, 15, 20, 0, 0));
    assert_eq!(scheduler.next_fire(), Some(local(2024, 6, 15, 21, 0, 0)));
}

#[tokio::test]
async fn test_coinciding_jobs_fire_in_same_tick() {
    let handler = Arc::new(RecordingHandler::default());
    let mut config = Config {
        schedules: vec![ScheduleEntry::new("cap_overnight", "10 3 * * *")],
        ..Config::default()
    };
    config.daemon.heartbeat_cron = String::new();
    let scheduler = CronScheduler::new(Arc::new(config), handler.clone());

    let fired = scheduler.tick(local(2024, 6, 15, 3, 10, 0));
    assert_eq!(fired, vec!["cap_overnight".to_string(), HOUSEKEEPING_JOB_ID.to_string()]);
    wait_for_runs(&handler, 2).await;
}

#[tokio::test]
async fn test_reload_replaces_job_set() {
    let handler = Arc::new(RecordingHandler::default());
    let scheduler = CronScheduler::new(Arc::new(Config::default()), handler);
    assert!(scheduler.jobs().contains(HEARTBEAT_JOB_ID));

    let config = captures_only(vec![ScheduleEntry::new("only", "*/15 * * * *")]);
    scheduler.reload(config.clone());

    let ids: Vec<_> = scheduler.jobs().iter().map(|j| j.id().to_string()).collect();
    assert_eq!(ids, vec!["only".to_string(), HOUSEKEEPING_JOB_ID.to_string()]);
    assert_eq!(*scheduler.config(), *config);
    assert!(scheduler.next_fire().is_some());
}

#[tokio::test]
async fn test_reload_to_empty_set_clears_deadline() {
    let handler = Arc::new(RecordingHandler::default());
    let scheduler = CronScheduler::new(Arc::new(Config::default()), handler);

    let mut config = Config {
        schedules: Vec::new(),
        ..Config::default()
    };
    config.housekeeping.cron = "not a cron".to_string();
    config.daemon.heartbeat_cron = String::new();

    assert_eq!(scheduler.reload(Arc::new(config)), None);
    assert!(scheduler.jobs().is_empty());
    assert_eq!(scheduler.next_fire(), None);
}

#[tokio::test]
async fn test_panicking_job_does_not_stop_dispatch() {
    let handler = Arc::new(PanickingHandler {
        calls: Mutex::new(0),
    });
    let config = captures_only(vec![ScheduleEntry::new("cap_evening", "0 18-23 * * *")]);
    let scheduler = CronScheduler::new(config, handler.clone());

    scheduler.tick(local(2024, 6, 15, 18, 0, 0));
    scheduler.tick(local(2024, 6, 15, 19, 0, 0));

    tokio::time::timeout(Duration::from_secs(5), async {
        while *handler.calls.lock() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("both runs should start");
    assert_eq!(scheduler.next_fire(), Some(local(2024, 6, 15, 20, 0, 0)));
}

#[tokio::test]
async fn test_run_fires_jobs_until_shutdown() {
    let handler = Arc::new(RecordingHandler::default());
    let config = captures_only(vec![ScheduleEntry::new("every_second", "* * * * * *")]);
    let scheduler = CronScheduler::new(config, handler.clone());

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(scheduler.clone().run(shutdown.clone()));

    wait_for_runs(&handler, 2).await;
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("scheduler did not stop")
        .unwrap();

    let ids = handler.ids();
    assert!(ids.iter().all(|id| id == "every_second"));
    let runs = handler.runs.lock().clone();
    assert_ne!(runs[0].2, runs[1].2);
}

#[tokio::test]
async fn test_run_with_no_jobs_waits_for_shutdown() {
    let handler = Arc::new(RecordingHandler::default());
    let mut config = Config {
        schedules: Vec::new(),
        ..Config::default()
    };
    config.housekeeping.cron = "bogus".to_string();
    config.daemon.heartbeat_cron = String::new();
    let scheduler = CronScheduler::new(Arc::new(config), handler.clone());
    assert_eq!(scheduler.next_fire(), None);

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(scheduler.clone().run(shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!task.is_finished());

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("scheduler did not stop")
        .unwrap();
    assert!(handler.ids().is_empty());
}

#[tokio::test]
async fn test_reload_wakes_idle_loop() {
    let handler = Arc::new(RecordingHandler::default());
    let mut config = Config {
        schedules: Vec::new(),
        ..Config::default()
    };
    config.housekeeping.cron = "bogus".to_string();
    config.daemon.heartbeat_cron = String::new();
    let scheduler = CronScheduler::new(Arc::new(config), handler.clone());

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(scheduler.clone().run(shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;

    scheduler.reload(captures_only(vec![ScheduleEntry::new("every_second", "* * * * * *")]));
    wait_for_runs(&handler, 1).await;

    shutdown.cancel();
    task.await.unwrap();
}

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;

use super::calendar::age_of;
use super::clock::Clock;
use super::device::{battery_percentage, Battery, Connectivity, Screen, SCREEN_LINES};
use super::formatter::{format_header, format_person_line, format_status};
use super::registry::PersonRegistry;
use super::time_sync::{TimeApi, TimeSync};
use crate::error::{LoopIterationError, ScreenError, StartupError};
use crate::models::{Instant, TimeSyncResult};

pub const ERROR_COOLDOWN: Duration = Duration::from_secs(60);
const BUSY_POLL: Duration = Duration::from_millis(50);
const ERROR_MESSAGE_CHARS: usize = 35;

pub type ScreenLines = [String; SCREEN_LINES];

/// Header plus one row per registered person; unused rows are blank.
pub fn compose_lines(
    registry: &PersonRegistry,
    sync: &TimeSyncResult,
    now: Option<Instant>,
    status: &str,
) -> ScreenLines {
    let mut lines: ScreenLines = Default::default();
    lines[0] = format_header(sync, status);
    for (row, person) in registry.people().iter().enumerate().take(SCREEN_LINES - 1) {
        let age = now.map(|now| age_of(&person.birth, &now));
        lines[row + 1] = format_person_line(&person.name, age.as_ref());
    }
    lines
}

pub async fn render<S: Screen>(screen: &mut S, lines: &ScreenLines) -> Result<(), ScreenError> {
    for (index, line) in lines.iter().enumerate() {
        screen.set_line(index, line);
    }
    screen.refresh()?;
    while screen.is_busy() {
        tokio::time::sleep(BUSY_POLL).await;
    }
    Ok(())
}

/// Draws the fixed startup failure screen.
pub async fn show_fatal<S: Screen>(screen: &mut S, err: &StartupError) {
    let mut lines: ScreenLines = Default::default();
    lines[0] = err.headline();
    lines[1] = "Check settings file.".to_string();
    if let Err(e) = render(screen, &lines).await {
        log::error!("Failed to draw fatal screen: {}", e);
    }
}

pub struct ControlLoop<N, A, C, S, B> {
    registry: PersonRegistry,
    sync: TimeSync<N, A>,
    clock: C,
    screen: S,
    battery: B,
    interval: Duration,
    cooldown: Duration,
    cycle: u64,
}

impl<N, A, C, S, B> ControlLoop<N, A, C, S, B>
where
    N: Connectivity,
    A: TimeApi,
    C: Clock,
    S: Screen,
    B: Battery,
{
    pub fn new(
        registry: PersonRegistry,
        sync: TimeSync<N, A>,
        clock: C,
        screen: S,
        battery: B,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            sync,
            clock,
            screen,
            battery,
            interval,
            cooldown: ERROR_COOLDOWN,
            cycle: 0,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// One full cycle: sync, compute, render. Returns what was drawn.
    pub async fn run_iteration(&mut self) -> Result<ScreenLines, LoopIterationError> {
        self.cycle += 1;
        log::info!("--- Loop {} ---", self.cycle);

        let sync = self.sync.run_cycle(&mut self.clock).await;
        let connected = self.sync.network().is_connected();
        let battery = self.battery.voltage().map(battery_percentage);
        let status = format_status(connected, battery);

        let lines = compose_lines(&self.registry, &sync, self.clock.now(), &status);
        for (index, line) in lines.iter().enumerate() {
            log::info!("Line {}: {}", index, line);
        }
        render(&mut self.screen, &lines).await?;
        Ok(lines)
    }

    /// Loops until `stop` resolves. `stop` is only observed while sleeping
    /// between cycles; a cycle in progress always completes.
    pub async fn run<F>(&mut self, stop: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        loop {
            let outcome = AssertUnwindSafe(self.run_iteration()).catch_unwind().await;
            let pause = match outcome {
                Ok(Ok(_)) => {
                    log::info!("Sleeping {} minutes...", self.interval.as_secs() / 60);
                    self.interval
                }
                Ok(Err(err)) => {
                    self.report_failure(&err).await;
                    self.cooldown
                }
                Err(payload) => {
                    let err = LoopIterationError::Panicked(panic_message(payload.as_ref()));
                    self.report_failure(&err).await;
                    self.cooldown
                }
            };

            tokio::select! {
                _ = &mut stop => {
                    log::info!("Stopped by user");
                    return;
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    async fn report_failure(&mut self, err: &LoopIterationError) {
        log::error!("Main loop error: {}", err);
        let mut lines: ScreenLines = Default::default();
        lines[0] = "ERROR IN MAIN LOOP".to_string();
        lines[1] = err.to_string().chars().take(ERROR_MESSAGE_CHARS).collect();
        lines[2] = "See diagnostic log.".to_string();
        if let Err(e) = render(&mut self.screen, &lines).await {
            log::error!("Error trying to display main loop error: {}", e);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimeSyncError;
    use crate::models::{Person, PersonSettings};
    use crate::services::time_sync::tests::{response, ManualClock, ScriptedApi, ScriptedLink};
    use crate::services::time_sync::resolve_zone;

    #[derive(Default)]
    struct MemoryScreen {
        lines: ScreenLines,
        refreshes: usize,
        failures_left: usize,
    }

    impl Screen for MemoryScreen {
        fn set_line(&mut self, index: usize, text: &str) {
            if let Some(line) = self.lines.get_mut(index) {
                *line = crate::services::device::truncate_line(text);
            }
        }

        fn refresh(&mut self) -> Result<(), ScreenError> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(ScreenError::NotReady("panel asleep".to_string()));
            }
            self.refreshes += 1;
            Ok(())
        }

        fn is_busy(&self) -> bool {
            false
        }
    }

    struct FixedBattery(Option<f32>);

    impl Battery for FixedBattery {
        fn voltage(&self) -> Option<f32> {
            self.0
        }
    }

    struct PanickingBattery;

    impl Battery for PanickingBattery {
        fn voltage(&self) -> Option<f32> {
            panic!("adc fault")
        }
    }

    fn registry() -> PersonRegistry {
        let slot = |name: &str, date: &str, time: &str, n: usize| PersonSettings {
            slot_name: format!("P{n}"),
            name: Some(name.to_string()),
            birth_date: Some(date.to_string()),
            birth_time: Some(time.to_string()),
            keys: Default::default(),
        };
        PersonRegistry::load(&[
            slot("Charles", "1999-01-01", "12:12:00", 1),
            slot("Kid", "2030-01-01", "00:00", 2),
        ])
        .expect("valid registry")
    }

    fn control_loop<B: Battery>(
        up: bool,
        replies: Vec<Result<crate::models::TimeApiResponse, TimeSyncError>>,
        screen: MemoryScreen,
        battery: B,
    ) -> ControlLoop<ScriptedLink, ScriptedApi, ManualClock, MemoryScreen, B> {
        let sync = TimeSync::new(
            ScriptedLink::new(up),
            ScriptedApi::new(replies),
            resolve_zone("America/Chicago"),
        )
        .with_settle_delay(Duration::ZERO);
        ControlLoop::new(
            registry(),
            sync,
            ManualClock::default(),
            screen,
            battery,
            Duration::from_secs(300),
        )
    }

    #[test]
    fn compose_fills_people_and_blanks_the_rest() {
        let sync = TimeSyncResult::synced(Instant::new(2025, 5, 24, 18, 30, 0), "CDT");
        let lines = compose_lines(&registry(), &sync, Some(sync.instant), "W:C B:50%");

        assert_eq!(lines[0], "May 24, 2025 @ 6:30PM CDT | W:C B:50%");
        assert_eq!(lines[1], "Charles: 26y, 4mo, 3w, 2d, 6h, 18min, 0s");
        assert_eq!(lines[2], "Kid: Cannot calculate");
        assert!(lines[3..].iter().all(String::is_empty));
    }

    #[test]
    fn compose_without_time_waits() {
        let sync = TimeSyncResult::fallback(TimeSyncError::NoNetwork);
        let lines = compose_lines(&registry(), &sync, None, "W:X B:--");
        assert_eq!(lines[0], "Time: No WiFi | W:X B:--");
        assert_eq!(lines[1], "Charles: Waiting for time...");
    }

    #[test]
    fn single_person_registry_renders() {
        let registry = PersonRegistry::load(&[PersonSettings {
            slot_name: "P1".to_string(),
            name: None,
            birth_date: Some("2000-02-29".to_string()),
            birth_time: Some("00:00".to_string()),
            keys: Default::default(),
        }])
        .expect("valid");
        assert_eq!(registry.people(), &[Person::new("P1", Instant::new(2000, 2, 29, 0, 0, 0))]);

        let now = Instant::new(2024, 3, 1, 0, 0, 0);
        let lines = compose_lines(&registry, &TimeSyncResult::synced(now, "CST"), Some(now), "W:C B:--");
        assert_eq!(lines[1], "P1: 24y, 0mo, 0w, 1d, 0h, 0min, 0s");
    }

    #[tokio::test]
    async fn api_failure_keeps_computing_against_last_good_sync() {
        let mut lp = control_loop(
            true,
            vec![
                Ok(response("2025-05-24T18:30:00-05:00", 0, "CDT")),
                Err(TimeSyncError::ApiError("503".to_string())),
            ],
            MemoryScreen::default(),
            FixedBattery(Some(4.2)),
        );

        let first = lp.run_iteration().await.expect("first cycle");
        let second = lp.run_iteration().await.expect("second cycle");

        assert_eq!(first[0], "May 24, 2025 @ 6:30PM CDT | W:C B:100%");
        assert_eq!(second[0], "Time: API Error | W:C B:100%");
        assert_eq!(second[1], first[1]);
        assert_eq!(second[1], "Charles: 26y, 4mo, 3w, 2d, 6h, 18min, 0s");
        assert_eq!(lp.clock().writes, 1);
        assert_eq!(lp.screen().refreshes, 2);
    }

    #[tokio::test]
    async fn never_synced_shows_waiting() {
        let mut lp = control_loop(false, vec![], MemoryScreen::default(), FixedBattery(None));
        let lines = lp.run_iteration().await.expect("cycle renders");
        assert_eq!(lines[0], "Time: No WiFi | W:X B:--");
        assert_eq!(lines[1], "Charles: Waiting for time...");
        assert_eq!(lines[2], "Kid: Waiting for time...");
    }

    #[tokio::test]
    async fn screen_failure_is_an_iteration_error() {
        let screen = MemoryScreen {
            failures_left: 1,
            ..Default::default()
        };
        let mut lp = control_loop(false, vec![], screen, FixedBattery(None));
        let err = lp.run_iteration().await.expect_err("refresh fails");
        assert!(matches!(err, LoopIterationError::Screen(_)));
    }

    #[tokio::test]
    async fn run_stops_at_first_sleep() {
        let mut lp = control_loop(
            true,
            vec![Ok(response("2025-05-24T18:30:00", 0, "CDT"))],
            MemoryScreen::default(),
            FixedBattery(Some(3.7)),
        );
        lp.run(std::future::ready(())).await;
        assert_eq!(lp.screen().refreshes, 1);
        assert!(lp.screen().lines[0].starts_with("May 24, 2025"));
    }

    #[tokio::test]
    async fn failed_iteration_draws_error_screen() {
        let screen = MemoryScreen {
            failures_left: 1,
            ..Default::default()
        };
        let mut lp = control_loop(false, vec![], screen, FixedBattery(None))
            .with_cooldown(Duration::from_millis(1));
        lp.run(std::future::ready(())).await;

        let lines = &lp.screen().lines;
        assert_eq!(lines[0], "ERROR IN MAIN LOOP");
        assert_eq!(lines[1], "display not ready: panel asleep");
        assert_eq!(lines[2], "See diagnostic log.");
        assert!(lines[3..].iter().all(String::is_empty));
    }

    #[tokio::test]
    async fn panic_inside_iteration_is_contained() {
        let mut lp = control_loop(false, vec![], MemoryScreen::default(), PanickingBattery);
        lp.run(std::future::ready(())).await;
        assert_eq!(lp.screen().lines[0], "ERROR IN MAIN LOOP");
        assert_eq!(lp.screen().lines[1], "panic: adc fault");
    }

    #[tokio::test]
    async fn fatal_screen_names_the_slot() {
        let mut screen = MemoryScreen::default();
        let err = StartupError::MissingPrimary {
            slot_name: "P1".to_string(),
            keys: "DISPLAY_NAME, BIRTH_DATE, BIRTH_TIME".to_string(),
        };
        show_fatal(&mut screen, &err).await;
        assert_eq!(screen.lines[0], "FATAL: Missing config for P1");
        assert_eq!(screen.lines[1], "Check settings file.");
        assert_eq!(screen.refreshes, 1);
    }
}

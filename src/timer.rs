use chrono::{DateTime, Utc};

// Stops shorter than this are treated as accidental starts and discarded.
pub const MIN_SESSION_SECONDS: i64 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimerState {
    #[default]
    Idle,
    Running {
        subject_id: String,
        goal_id: Option<String>,
        started_at: DateTime<Utc>,
        elapsed_offset: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedTimer {
    pub subject_id: String,
    pub goal_id: Option<String>,
    pub duration_seconds: i64,
}

impl TimerState {
    // Starting is only offered from Idle in the dashboard; a second start
    // simply replaces the running slot.
    pub fn start(&mut self, subject_id: String, goal_id: Option<String>, now: DateTime<Utc>) {
        *self = TimerState::Running {
            subject_id,
            goal_id,
            started_at: now,
            elapsed_offset: 0,
        };
    }

    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<FinishedTimer> {
        match std::mem::replace(self, TimerState::Idle) {
            TimerState::Idle => None,
            TimerState::Running {
                subject_id,
                goal_id,
                started_at,
                elapsed_offset,
            } => {
                let duration_seconds = (now - started_at).num_seconds() + elapsed_offset;
                if duration_seconds > MIN_SESSION_SECONDS {
                    Some(FinishedTimer {
                        subject_id,
                        goal_id,
                        duration_seconds,
                    })
                } else {
                    None
                }
            }
        }
    }

    pub fn reset(&mut self) {
        *self = TimerState::Idle;
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        match self {
            TimerState::Idle => 0,
            TimerState::Running {
                started_at,
                elapsed_offset,
                ..
            } => (now - *started_at).num_seconds() + elapsed_offset,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running { .. })
    }

    pub fn subject_id(&self) -> Option<&str> {
        match self {
            TimerState::Idle => None,
            TimerState::Running { subject_id, .. } => Some(subject_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{FinishedTimer, TimerState};

    #[test]
    fn short_runs_are_discarded() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut timer = TimerState::default();
        timer.start("sub_1".to_string(), None, start);
        assert!(timer.is_running());

        let finished = timer.stop(start + Duration::seconds(3));
        assert_eq!(finished, None);
        assert_eq!(timer, TimerState::Idle);
    }

    #[test]
    fn longer_runs_commit_with_measured_duration() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut timer = TimerState::default();
        timer.start("sub_1".to_string(), Some("goal_1".to_string()), start);

        let finished = timer.stop(start + Duration::seconds(10));
        assert_eq!(
            finished,
            Some(FinishedTimer {
                subject_id: "sub_1".to_string(),
                goal_id: Some("goal_1".to_string()),
                duration_seconds: 10,
            })
        );
        assert_eq!(timer, TimerState::Idle);
    }

    #[test]
    fn elapsed_offset_counts_toward_the_committed_duration() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut timer = TimerState::Running {
            subject_id: "sub_1".to_string(),
            goal_id: None,
            started_at: start,
            elapsed_offset: 120,
        };
        assert_eq!(timer.elapsed_seconds(start + Duration::seconds(30)), 150);

        let finished = timer.stop(start + Duration::seconds(30)).expect("commit");
        assert_eq!(finished.duration_seconds, 150);
    }

    #[test]
    fn elapsed_samples_the_wall_clock() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut timer = TimerState::default();
        assert_eq!(timer.elapsed_seconds(start), 0);

        timer.start("sub_1".to_string(), None, start);
        assert_eq!(timer.elapsed_seconds(start), 0);
        assert_eq!(timer.elapsed_seconds(start + Duration::seconds(61)), 61);
    }

    #[test]
    fn stopping_while_idle_is_a_no_op() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut timer = TimerState::default();
        assert_eq!(timer.stop(now), None);
    }

    #[test]
    fn reset_discards_a_running_timer() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut timer = TimerState::default();
        timer.start("sub_1".to_string(), None, start);
        timer.reset();
        assert_eq!(timer, TimerState::Idle);
        assert_eq!(timer.stop(start + Duration::seconds(100)), None);
    }
}

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::domain::{Goal, Session, Subject};

pub fn total_for_date(sessions: &[Session], date: NaiveDate) -> i64 {
    sessions
        .iter()
        .filter(|session| session.date == date)
        .map(|session| session.duration_seconds)
        .sum()
}

pub fn total_for_subject_on_date(sessions: &[Session], subject_id: &str, date: NaiveDate) -> i64 {
    sessions
        .iter()
        .filter(|session| session.date == date && session.subject_id == subject_id)
        .map(|session| session.duration_seconds)
        .sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendDay {
    pub date: NaiveDate,
    pub hours: f64,
}

// The 7 calendar days ending today inclusive, in hours to one decimal.
pub fn seven_day_trend(sessions: &[Session], today: NaiveDate) -> Vec<TrendDay> {
    (0..7)
        .map(|offset| {
            let date = today - Duration::days(6 - offset);
            let seconds = total_for_date(sessions, date);
            TrendDay {
                date,
                hours: (seconds as f64 / 3600.0 * 10.0).round() / 10.0,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectTotal {
    pub subject_id: String,
    pub name: String,
    pub color: String,
    pub total_seconds: i64,
}

// Zero-total subjects stay in the ranked list; chart rendering filters them.
pub fn subject_distribution(subjects: &[Subject], sessions: &[Session]) -> Vec<SubjectTotal> {
    let mut totals = subjects
        .iter()
        .map(|subject| {
            let total_seconds = sessions
                .iter()
                .filter(|session| session.subject_id == subject.id)
                .map(|session| session.duration_seconds)
                .sum();
            SubjectTotal {
                subject_id: subject.id.clone(),
                name: subject.name.clone(),
                color: subject.color.clone(),
                total_seconds,
            }
        })
        .collect::<Vec<_>>();

    totals.sort_by(|left, right| {
        right
            .total_seconds
            .cmp(&left.total_seconds)
            .then_with(|| left.name.cmp(&right.name))
    });
    totals
}

pub fn top_days(sessions: &[Session], limit: usize) -> Vec<(NaiveDate, i64)> {
    let mut daily_totals: HashMap<NaiveDate, i64> = HashMap::new();
    for session in sessions {
        *daily_totals.entry(session.date).or_insert(0) += session.duration_seconds;
    }

    let mut rows = daily_totals.into_iter().collect::<Vec<_>>();
    rows.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
    rows.truncate(limit);
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub progress_seconds: i64,
    pub percentage: Option<f64>,
    pub is_complete: bool,
    pub is_expired: bool,
    pub days_left: i64,
}

pub fn goal_progress_seconds(sessions: &[Session], goal_id: &str) -> i64 {
    sessions
        .iter()
        .filter(|session| session.goal_id.as_deref() == Some(goal_id))
        .map(|session| session.duration_seconds)
        .sum()
}

// Progress is lifetime, not bounded by the deadline window. Completion is
// derived from the clamped percentage; the stored is_completed flag only
// participates in the expired check.
pub fn goal_progress(goal: &Goal, sessions: &[Session], today: NaiveDate) -> GoalProgress {
    let progress_seconds = goal_progress_seconds(sessions, &goal.id);
    let target_seconds = goal.target_hours.unwrap_or(0.0) * 3600.0;

    let percentage = if target_seconds > 0.0 {
        Some((progress_seconds as f64 / target_seconds * 100.0).min(100.0))
    } else {
        None
    };
    let is_complete = percentage.is_some_and(|value| value >= 100.0);
    let is_expired = today > goal.deadline && !goal.is_completed && !is_complete;

    GoalProgress {
        progress_seconds,
        percentage,
        is_complete,
        is_expired,
        days_left: (goal.deadline - today).num_days(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::domain::{Goal, Session, Subject, seed_data};

    use super::{
        goal_progress, seven_day_trend, subject_distribution, top_days, total_for_date,
        total_for_subject_on_date,
    };

    fn session(subject_id: &str, date: NaiveDate, duration_seconds: i64) -> Session {
        Session {
            id: format!("{subject_id}-{date}-{duration_seconds}"),
            subject_id: subject_id.to_string(),
            date,
            duration_seconds,
            goal_id: None,
            notes: None,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn date_totals_are_arithmetic_sums() {
        let sessions = vec![
            session("sub_1", day(1), 600),
            session("sub_2", day(1), 900),
            session("sub_1", day(2), 1200),
        ];
        assert_eq!(total_for_date(&sessions, day(1)), 1500);
        assert_eq!(total_for_date(&sessions, day(2)), 1200);
        assert_eq!(total_for_date(&sessions, day(3)), 0);
        assert_eq!(total_for_subject_on_date(&sessions, "sub_1", day(1)), 600);
        assert_eq!(total_for_subject_on_date(&sessions, "sub_3", day(1)), 0);
    }

    #[test]
    fn trend_covers_seven_days_ending_today() {
        let today = day(10);
        let sessions = vec![
            session("sub_1", day(4), 3600),
            session("sub_1", day(10), 5400),
            session("sub_1", day(3), 7200), // outside the window
        ];

        let trend = seven_day_trend(&sessions, today);
        assert_eq!(trend.len(), 7);
        assert_eq!(trend[0].date, day(4));
        assert_eq!(trend[0].hours, 1.0);
        assert_eq!(trend[6].date, day(10));
        assert_eq!(trend[6].hours, 1.5);
        assert!(trend[1..6].iter().all(|entry| entry.hours == 0.0));
    }

    #[test]
    fn distribution_ranks_descending_and_keeps_zeros() {
        let data = seed_data();
        let subjects = &data.current_user().subjects;
        let sessions = vec![
            session("sub_2", day(1), 1800),
            session("sub_1", day(1), 600),
            session("sub_2", day(2), 1800),
        ];

        let ranked = subject_distribution(subjects, &sessions);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].name, "Blender");
        assert_eq!(ranked[0].total_seconds, 3600);
        assert_eq!(ranked[1].name, "Personal Project");
        assert_eq!(ranked[2].name, "React/Code");
        assert_eq!(ranked[2].total_seconds, 0);
    }

    #[test]
    fn top_days_takes_the_five_largest() {
        let mut sessions = Vec::new();
        for value in 1..=7u32 {
            sessions.push(session("sub_1", day(value), value as i64 * 600));
        }
        sessions.push(session("sub_2", day(7), 600));

        let top = top_days(&sessions, 5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0], (day(7), 4800));
        assert_eq!(top[4], (day(3), 1800));
    }

    #[test]
    fn aggregates_ignore_deleted_sessions() {
        let mut data = seed_data();
        data.add_session(session("sub_1", day(1), 600));
        data.add_session(session("sub_1", day(1), 900));
        let doomed = data.current_user().sessions[0].id.clone();
        data.delete_session(&doomed);

        assert_eq!(total_for_date(&data.current_user().sessions, day(1)), 900);
    }

    fn goal(target_hours: Option<f64>, deadline: NaiveDate) -> Goal {
        Goal::create(
            "Ship it".to_string(),
            None,
            deadline,
            vec!["sub_1".to_string()],
            target_hours,
            &[] as &[Subject],
        )
    }

    fn tagged(goal_id: &str, duration_seconds: i64) -> Session {
        Session {
            goal_id: Some(goal_id.to_string()),
            ..session("sub_1", day(1), duration_seconds)
        }
    }

    #[test]
    fn goal_percentage_clamps_at_one_hundred() {
        let goal = goal(Some(1.0), day(20));
        let sessions = vec![tagged(&goal.id, 7200)];

        let progress = goal_progress(&goal, &sessions, day(10));
        assert_eq!(progress.progress_seconds, 7200);
        assert_eq!(progress.percentage, Some(100.0));
        assert!(progress.is_complete);
        assert!(!progress.is_expired);
    }

    #[test]
    fn goal_without_target_has_no_percentage() {
        let goal = goal(None, day(20));
        let sessions = vec![tagged(&goal.id, 7200)];

        let progress = goal_progress(&goal, &sessions, day(10));
        assert_eq!(progress.progress_seconds, 7200);
        assert_eq!(progress.percentage, None);
        assert!(!progress.is_complete);
        assert_eq!(progress.days_left, 10);
    }

    #[test]
    fn goal_expires_past_deadline_when_under_target() {
        let goal = goal(Some(10.0), day(5));
        let sessions = vec![tagged(&goal.id, 3600)];

        let progress = goal_progress(&goal, &sessions, day(10));
        assert!(progress.is_expired);
        assert!(!progress.is_complete);
        assert_eq!(progress.days_left, -5);

        let complete = goal_progress(&goal, &[tagged(&goal.id, 36000)], day(10));
        assert!(complete.is_complete);
        assert!(!complete.is_expired);
    }

    #[test]
    fn goal_progress_counts_only_tagged_sessions() {
        let goal = goal(Some(2.0), day(20));
        let sessions = vec![
            tagged(&goal.id, 1800),
            tagged("other", 3600),
            session("sub_1", day(1), 3600),
        ];

        let progress = goal_progress(&goal, &sessions, day(10));
        assert_eq!(progress.progress_seconds, 1800);
        assert_eq!(progress.percentage, Some(25.0));
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

const ID_LEN: usize = 8;

pub const SUBJECT_COLORS: [&str; 11] = [
    "#ef4444", // red
    "#f97316", // orange
    "#f59e0b", // amber
    "#84cc16", // lime
    "#10b981", // emerald
    "#06b6d4", // cyan
    "#3b82f6", // blue
    "#6366f1", // indigo
    "#8b5cf6", // violet
    "#d946ef", // fuchsia
    "#f43f5e", // rose
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub deadline: NaiveDate,
    pub linked_subject_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_hours: Option<f64>,
    pub is_completed: bool,
}

impl Goal {
    // An empty subject selection links the goal to every current subject.
    pub fn create(
        name: String,
        description: Option<String>,
        deadline: NaiveDate,
        linked_subject_ids: Vec<String>,
        target_hours: Option<f64>,
        all_subjects: &[Subject],
    ) -> Self {
        let linked_subject_ids = if linked_subject_ids.is_empty() {
            all_subjects.iter().map(|subject| subject.id.clone()).collect()
        } else {
            linked_subject_ids
        };

        Self {
            id: generate_id(),
            name,
            description,
            deadline,
            linked_subject_ids,
            target_hours,
            is_completed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub subject_id: String,
    pub date: NaiveDate,
    pub duration_seconds: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub id: String,
    pub name: String,
    pub subjects: Vec<Subject>,
    pub goals: Vec<Goal>,
    pub sessions: Vec<Session>,
}

impl UserData {
    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|subject| subject.id == id)
    }

    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.id == id)
    }

    pub fn goals_for_subject(&self, subject_id: &str) -> Vec<&Goal> {
        self.goals
            .iter()
            .filter(|goal| {
                !goal.is_completed
                    && goal
                        .linked_subject_ids
                        .iter()
                        .any(|linked| linked == subject_id)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub users: Vec<UserData>,
    pub current_user_id: String,
}

impl AppData {
    pub fn current_user(&self) -> &UserData {
        self.users
            .iter()
            .find(|user| user.id == self.current_user_id)
            .or_else(|| self.users.first())
            .expect("app data must contain at least one user")
    }

    pub fn current_user_mut(&mut self) -> &mut UserData {
        let index = self
            .users
            .iter()
            .position(|user| user.id == self.current_user_id)
            .unwrap_or(0);
        self.users
            .get_mut(index)
            .expect("app data must contain at least one user")
    }

    pub fn user(&self, id: &str) -> Option<&UserData> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn switch_user(&mut self, user_id: &str) {
        self.current_user_id = user_id.to_string();
    }

    pub fn add_subject(&mut self, name: String) -> String {
        let id = generate_id();
        self.current_user_mut().subjects.push(Subject {
            id: id.clone(),
            name,
            color: random_color(),
        });
        id
    }

    pub fn add_goal(&mut self, goal: Goal) {
        self.current_user_mut().goals.push(goal);
    }

    pub fn add_session(&mut self, session: Session) {
        self.current_user_mut().sessions.push(session);
    }

    pub fn delete_session(&mut self, session_id: &str) -> bool {
        let sessions = &mut self.current_user_mut().sessions;
        let before = sessions.len();
        sessions.retain(|session| session.id != session_id);
        sessions.len() < before
    }
}

pub fn seed_data() -> AppData {
    let default_subjects = || {
        vec![
            Subject {
                id: "sub_1".to_string(),
                name: "Personal Project".to_string(),
                color: "#3b82f6".to_string(),
            },
            Subject {
                id: "sub_2".to_string(),
                name: "Blender".to_string(),
                color: "#f97316".to_string(),
            },
            Subject {
                id: "sub_3".to_string(),
                name: "React/Code".to_string(),
                color: "#10b981".to_string(),
            },
        ]
    };

    AppData {
        users: vec![
            UserData {
                id: "user_1".to_string(),
                name: "User 1".to_string(),
                subjects: default_subjects(),
                goals: Vec::new(),
                sessions: Vec::new(),
            },
            UserData {
                id: "user_2".to_string(),
                name: "User 2".to_string(),
                subjects: default_subjects(),
                goals: Vec::new(),
                sessions: Vec::new(),
            },
        ],
        current_user_id: "user_1".to_string(),
    }
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

pub fn random_color() -> String {
    let index = thread_rng().gen_range(0..SUBJECT_COLORS.len());
    SUBJECT_COLORS[index].to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{AppData, Goal, Session, generate_id, seed_data};

    fn session(id: &str, subject_id: &str, date: NaiveDate, duration_seconds: i64) -> Session {
        Session {
            id: id.to_string(),
            subject_id: subject_id.to_string(),
            date,
            duration_seconds,
            goal_id: None,
            notes: None,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn seed_contains_two_users_with_default_subjects() {
        let data = seed_data();
        assert_eq!(data.users.len(), 2);
        assert_eq!(data.current_user_id, "user_1");
        for user in &data.users {
            assert_eq!(user.subjects.len(), 3);
            assert!(user.goals.is_empty());
            assert!(user.sessions.is_empty());
        }
    }

    #[test]
    fn unknown_current_user_falls_back_to_first() {
        let mut data = seed_data();
        data.switch_user("nobody");
        assert_eq!(data.current_user().id, "user_1");
    }

    #[test]
    fn add_subject_appends_to_active_user_only() {
        let mut data = seed_data();
        let id = data.add_subject("Music".to_string());
        let subject = data.current_user().subject(&id).expect("subject exists");
        assert_eq!(subject.name, "Music");
        assert!(subject.color.starts_with('#'));
        assert_eq!(data.users[0].subjects.len(), 4);
        assert_eq!(data.users[1].subjects.len(), 3);
    }

    #[test]
    fn delete_session_removes_exactly_one_record() {
        let mut data = seed_data();
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        data.add_session(session("a", "sub_1", date, 100));
        data.add_session(session("b", "sub_2", date, 200));
        data.add_session(session("c", "sub_1", date, 300));

        assert!(data.delete_session("b"));
        let ids = data
            .current_user()
            .sessions
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["a", "c"]);

        assert!(!data.delete_session("b"));
        assert_eq!(data.current_user().sessions.len(), 2);
    }

    #[test]
    fn mutations_follow_the_active_user() {
        let mut data = seed_data();
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        data.add_session(session("a", "sub_1", date, 100));
        data.switch_user("user_2");
        data.add_session(session("b", "sub_1", date, 200));

        assert_eq!(data.users[0].sessions.len(), 1);
        assert_eq!(data.users[1].sessions.len(), 1);
        assert_eq!(data.current_user().sessions[0].id, "b");
    }

    #[test]
    fn goal_create_defaults_to_all_subjects() {
        let data = seed_data();
        let deadline = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let goal = Goal::create(
            "Ship it".to_string(),
            None,
            deadline,
            Vec::new(),
            Some(20.0),
            &data.current_user().subjects,
        );
        assert_eq!(goal.linked_subject_ids, ["sub_1", "sub_2", "sub_3"]);
        assert!(!goal.is_completed);

        let narrow = Goal::create(
            "Focus".to_string(),
            None,
            deadline,
            vec!["sub_2".to_string()],
            None,
            &data.current_user().subjects,
        );
        assert_eq!(narrow.linked_subject_ids, ["sub_2"]);
    }

    #[test]
    fn goals_for_subject_filters_completed_and_unlinked() {
        let mut data = seed_data();
        let deadline = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let linked = Goal::create(
            "Linked".to_string(),
            None,
            deadline,
            vec!["sub_1".to_string()],
            None,
            &data.current_user().subjects,
        );
        let mut finished = Goal::create(
            "Finished".to_string(),
            None,
            deadline,
            vec!["sub_1".to_string()],
            None,
            &data.current_user().subjects,
        );
        finished.is_completed = true;
        let other = Goal::create(
            "Other".to_string(),
            None,
            deadline,
            vec!["sub_2".to_string()],
            None,
            &data.current_user().subjects,
        );
        data.add_goal(linked);
        data.add_goal(finished);
        data.add_goal(other);

        let eligible = data.current_user().goals_for_subject("sub_1");
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].name, "Linked");
    }

    #[test]
    fn generated_ids_are_distinct() {
        let first = generate_id();
        let second = generate_id();
        assert_eq!(first.len(), 8);
        assert_ne!(first, second);
    }

    #[test]
    fn app_data_round_trips_through_json() {
        let mut data = seed_data();
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        data.add_session(session("a", "sub_1", date, 90));
        let deadline = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let goal = Goal::create(
            "Ship it".to_string(),
            Some("v1".to_string()),
            deadline,
            Vec::new(),
            Some(20.0),
            &data.current_user().subjects,
        );
        data.add_goal(goal);

        let encoded = serde_json::to_string(&data).expect("encode");
        assert!(encoded.contains("\"currentUserId\""));
        assert!(encoded.contains("\"durationSeconds\""));
        assert!(encoded.contains("\"linkedSubjectIds\""));

        let decoded: AppData = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded.users.len(), 2);
        assert_eq!(decoded.current_user().sessions.len(), 1);
        assert_eq!(decoded.current_user().goals.len(), 1);
    }
}

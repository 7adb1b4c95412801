mod config;
mod domain;
mod duration;
mod logging;
mod stats;
mod storage;
mod timer;
mod ui;

use std::error::Error;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::domain::{Goal, Session, UserData, generate_id};
use crate::duration::{format_duration, parse_duration_input};
use crate::stats::{
	goal_progress, seven_day_trend, subject_distribution, top_days, total_for_date,
	total_for_subject_on_date,
};
use crate::storage::{Store, export_data, load_share_url, save_share_url};
use crate::ui::run_dashboard;

#[derive(Debug, Parser)]
#[command(name = "devrating", about = "Terminal time tracking and goal management")]
struct Cli {
	#[arg(long)]
	data_dir: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init,
	Dashboard,
	Users,
	SwitchUser {
		#[arg(long)]
		user: String,
	},
	AddSubject {
		#[arg(long)]
		name: String,
	},
	AddGoal {
		#[arg(long)]
		name: String,
		#[arg(long)]
		deadline: String,
		#[arg(long)]
		target_hours: Option<f64>,
		#[arg(long)]
		description: Option<String>,
		#[arg(long = "subject")]
		subjects: Vec<String>,
	},
	Log {
		#[arg(long)]
		subject: String,
		#[arg(long)]
		duration: String,
		#[arg(long)]
		goal: Option<String>,
		#[arg(long)]
		notes: Option<String>,
		#[arg(long)]
		date: Option<String>,
	},
	Sessions {
		#[arg(long)]
		day: Option<String>,
	},
	DeleteSession {
		#[arg(long)]
		id: String,
	},
	Goals,
	Summary {
		#[arg(long)]
		day: Option<String>,
	},
	Stats,
	Export {
		#[arg(long)]
		out: Option<PathBuf>,
	},
	ShareUrl {
		#[arg(long)]
		set: Option<String>,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let app_config = config::load_config();
	let data_dir = config::resolve_data_dir(cli.data_dir, &app_config);

	if let Err(err) = logging::init_logging(&data_dir, app_config.log_filter.as_deref(), false) {
		eprintln!("warning: failed to initialize logging: {err}");
	}

	let mut store = Store::open(config::data_file(&data_dir));

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Init => {
			store.update(|_| ());
			println!("initialized data at {}", store.path().display());
		}
		Command::Dashboard => {
			run_dashboard(&mut store, &data_dir)?;
		}
		Command::Users => {
			print_users(&store);
		}
		Command::SwitchUser { user } => {
			let (user_id, user_name) = resolve_user(&store, &user)?;
			store.update(|data| data.switch_user(&user_id));
			println!("switched to {user_name}");
		}
		Command::AddSubject { name } => {
			let id = store.update(|data| data.add_subject(name.clone()));
			println!("created subject {name} ({id})");
		}
		Command::AddGoal {
			name,
			deadline,
			target_hours,
			description,
			subjects,
		} => {
			let deadline = parse_date(&deadline)?;
			let all_subjects = store.data().current_user().subjects.clone();
			let linked = subjects
				.iter()
				.map(|reference| resolve_subject(store.data().current_user(), reference))
				.collect::<Result<Vec<_>, _>>()?;

			let goal = Goal::create(
				name.clone(),
				description,
				deadline,
				linked,
				target_hours.filter(|value| *value > 0.0),
				&all_subjects,
			);
			let goal_id = goal.id.clone();
			store.update(|data| data.add_goal(goal));
			println!("created goal {name} ({goal_id})");
		}
		Command::Log {
			subject,
			duration,
			goal,
			notes,
			date,
		} => {
			let subject_id = resolve_subject(store.data().current_user(), &subject)?;
			let seconds = parse_duration_input(&duration);
			if seconds <= 0 {
				return Err(format!("could not parse duration '{duration}'").into());
			}
			let date = parse_day(date.as_deref())?;
			let goal_id = goal
				.map(|reference| resolve_goal(store.data().current_user(), &reference))
				.transpose()?;

			let session = Session {
				id: generate_id(),
				subject_id: subject_id.clone(),
				date,
				duration_seconds: seconds,
				goal_id,
				notes,
				timestamp: Utc::now(),
			};
			store.update(|data| data.add_session(session));

			let subject_name = subject_label(store.data().current_user(), &subject_id);
			println!(
				"logged {} to {subject_name} on {date}",
				format_duration(seconds)
			);
		}
		Command::Sessions { day } => {
			let day = parse_day(day.as_deref())?;
			print_sessions(&store, day);
		}
		Command::DeleteSession { id } => {
			if store.update(|data| data.delete_session(&id)) {
				println!("deleted session {id}");
			} else {
				println!("no session with id {id}");
			}
		}
		Command::Goals => {
			print_goals(&store);
		}
		Command::Summary { day } => {
			let day = parse_day(day.as_deref())?;
			print_summary(&store, day);
		}
		Command::Stats => {
			print_stats(&store);
		}
		Command::Export { out } => {
			let out_dir = out.unwrap_or_else(|| PathBuf::from("."));
			let path = export_data(store.data(), &out_dir, Utc::now().date_naive())?;
			println!("exported to {}", path.display());
		}
		Command::ShareUrl { set } => match set {
			Some(url) => {
				save_share_url(&data_dir, &url)?;
				println!("share url saved");
			}
			None => match load_share_url(&data_dir) {
				Some(url) => println!("{url}"),
				None => println!("(not set)"),
			},
		},
	}

	Ok(())
}

fn parse_date(input: &str) -> Result<NaiveDate, Box<dyn Error>> {
	NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
		.map_err(|_| format!("invalid date '{input}', expected YYYY-MM-DD").into())
}

fn parse_day(input: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
	match input {
		Some(raw) => parse_date(raw),
		None => Ok(Utc::now().date_naive()),
	}
}

fn resolve_user(store: &Store, reference: &str) -> Result<(String, String), String> {
	store
		.data()
		.users
		.iter()
		.find(|user| user.id == reference || user.name == reference)
		.map(|user| (user.id.clone(), user.name.clone()))
		.ok_or_else(|| format!("user not found: {reference}"))
}

fn resolve_subject(user: &UserData, reference: &str) -> Result<String, String> {
	user.subjects
		.iter()
		.find(|subject| subject.id == reference || subject.name == reference)
		.map(|subject| subject.id.clone())
		.ok_or_else(|| format!("subject not found: {reference}"))
}

fn resolve_goal(user: &UserData, reference: &str) -> Result<String, String> {
	user.goals
		.iter()
		.find(|goal| goal.id == reference || goal.name == reference)
		.map(|goal| goal.id.clone())
		.ok_or_else(|| format!("goal not found: {reference}"))
}

fn subject_label(user: &UserData, subject_id: &str) -> String {
	user.subject(subject_id)
		.map(|subject| subject.name.clone())
		.unwrap_or_else(|| "Unknown subject".to_string())
}

fn print_users(store: &Store) {
	let data = store.data();
	let current_id = data.current_user().id.clone();
	for user in &data.users {
		let marker = if user.id == current_id { "*" } else { " " };
		println!("{marker} {} ({})", user.name, user.id);
	}
}

fn print_sessions(store: &Store, day: NaiveDate) {
	let user = store.data().current_user();
	let mut sessions = user
		.sessions
		.iter()
		.filter(|session| session.date == day)
		.collect::<Vec<_>>();
	sessions.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));

	println!(
		"sessions for {day} | total {}",
		format_duration(total_for_date(&user.sessions, day))
	);
	if sessions.is_empty() {
		println!("no activity logged for this day");
		return;
	}

	for session in sessions {
		let goal = session
			.goal_id
			.as_ref()
			.and_then(|goal_id| user.goal(goal_id))
			.map(|goal| format!(" | goal: {}", goal.name))
			.unwrap_or_default();
		let notes = session
			.notes
			.as_ref()
			.map(|notes| format!(" | {notes}"))
			.unwrap_or_default();
		println!(
			"{} | {} | {}{goal}{notes}",
			session.id,
			format_duration(session.duration_seconds),
			subject_label(user, &session.subject_id),
		);
	}
}

fn print_goals(store: &Store) {
	let user = store.data().current_user();
	if user.goals.is_empty() {
		println!("no goals set yet");
		return;
	}

	let today = Utc::now().date_naive();
	for goal in &user.goals {
		let progress = goal_progress(goal, &user.sessions, today);
		let mut line = format!(
			"{} | {} spent",
			goal.name,
			format_duration(progress.progress_seconds)
		);
		if let (Some(percentage), Some(target_hours)) = (progress.percentage, goal.target_hours) {
			line.push_str(&format!(" | {percentage:.0}% of {target_hours}h"));
		}
		line.push_str(&format!(" | deadline {}", goal.deadline));
		if progress.is_complete {
			line.push_str(" | done");
		} else if progress.is_expired {
			line.push_str(" | expired");
		} else {
			line.push_str(&format!(" | {} days left", progress.days_left));
		}
		println!("{line}");
	}
}

fn print_summary(store: &Store, day: NaiveDate) {
	let user = store.data().current_user();
	println!(
		"summary for {day} | total {}",
		format_duration(total_for_date(&user.sessions, day))
	);

	for subject in &user.subjects {
		let seconds = total_for_subject_on_date(&user.sessions, &subject.id, day);
		println!("{} | {}", format_duration(seconds), subject.name);
	}
}

fn print_stats(store: &Store) {
	let user = store.data().current_user();
	let today = Utc::now().date_naive();

	println!("last 7 days:");
	for entry in seven_day_trend(&user.sessions, today) {
		println!("{} {} | {:.1}h", entry.date.format("%a"), entry.date, entry.hours);
	}

	println!("\ntop subjects:");
	for (index, entry) in subject_distribution(&user.subjects, &user.sessions)
		.iter()
		.enumerate()
	{
		println!(
			"{:>2}. {} | {}",
			index + 1,
			entry.name,
			format_duration(entry.total_seconds)
		);
	}

	println!("\nmost productive days:");
	let top = top_days(&user.sessions, 5);
	if top.is_empty() {
		println!("no sessions yet");
		return;
	}
	for (index, (date, total)) in top.iter().enumerate() {
		println!("{:>2}. {date} | {}", index + 1, format_duration(*total));
	}
}

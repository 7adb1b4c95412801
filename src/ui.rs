use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs};
use ratatui::{Frame, Terminal};

use crate::domain::{Goal, Session, UserData, generate_id};
use crate::duration::{format_duration, format_duration_digital, parse_duration_input};
use crate::stats::{
	GoalProgress, SubjectTotal, TrendDay, goal_progress, seven_day_trend, subject_distribution,
	top_days, total_for_date, total_for_subject_on_date,
};
use crate::storage::{Store, export_data, load_share_url, save_share_url};
use crate::timer::{MIN_SESSION_SECONDS, TimerState};

const FOCUSED_BORDER_COLOR: Color = Color::Yellow;
const PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const GOAL_BAR_WIDTH: usize = 24;
const TREND_BAR_WIDTH: usize = 16;

pub fn run_dashboard(store: &mut Store, data_dir: &Path) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, store, data_dir);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	store: &mut Store,
	data_dir: &Path,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(load_share_url(data_dir));

	loop {
		let now = Utc::now();
		let view = build_view(&app, store, now);
		app.clamp_selection(&view);
		terminal.draw(|frame| draw(frame, &app, &view))?;

		// One-second poll so a running timer's readout refreshes each tick.
		if event::poll(StdDuration::from_millis(1000))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code, store, data_dir),
					InputMode::Select(_) => handle_select_key(&mut app, key.code, store),
					InputMode::MultiSelect(_) => handle_multi_select_key(&mut app, key.code, store),
					InputMode::Normal => handle_normal_key(&mut app, key.code, store, &view),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw(frame: &mut Frame, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(5)])
		.split(frame.area());

	render_tabs(frame, layout[0], app);

	match app.view {
		View::Today => render_today(frame, layout[1], app, view),
		View::Log => render_log(frame, layout[1], app, view),
		View::Goals => render_goals(frame, layout[1], app, view),
		View::Stats => render_stats(frame, layout[1], view),
		View::Settings => render_settings(frame, layout[1], app, view),
	}

	render_footer(frame, layout[2], app);

	match &app.mode {
		InputMode::Select(select) => render_select_popup(frame, select),
		InputMode::MultiSelect(select) => render_multi_select_popup(frame, select),
		InputMode::Normal | InputMode::Prompt(_) => {}
	}
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
	let titles = View::ALL
		.iter()
		.enumerate()
		.map(|(index, view)| Line::from(format!("{} {}", index + 1, view.title())))
		.collect::<Vec<_>>();

	let tabs = Tabs::new(titles)
		.select(app.view.index())
		.block(Block::default().borders(Borders::ALL).title("DevRating"))
		.highlight_style(
			Style::default()
				.fg(FOCUSED_BORDER_COLOR)
				.add_modifier(Modifier::BOLD),
		);
	frame.render_widget(tabs, area);
}

fn render_today(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(3), Constraint::Min(4), Constraint::Length(5)])
		.split(area);

	let header = Paragraph::new(Line::from(format!(
		"{} | total {}",
		view.today.format("%A, %d %B %Y"),
		format_duration(view.today_total)
	)))
	.block(panel_block("Today", true));
	frame.render_widget(header, layout[0]);

	let items = view
		.subject_rows
		.iter()
		.map(|row| {
			let mut spans = vec![
				Span::styled(row.name.clone(), row.style),
				Span::raw(format!(" | today {}", format_duration(row.today_seconds))),
			];
			if row.is_running {
				spans.push(Span::styled(
					" | RUNNING",
					Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
				));
			}
			ListItem::new(Line::from(spans))
		})
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !view.subject_rows.is_empty() {
		state.select(Some(app.today_index.min(view.subject_rows.len() - 1)));
	}

	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(no subjects yet, add one in Settings)")]
	} else {
		items
	})
	.block(panel_block("Subjects", false))
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));
	frame.render_stateful_widget(list, layout[1], &mut state);

	let timer_lines = match &view.timer {
		Some(timer) => vec![
			Line::from(vec![
				Span::raw("Current session: "),
				Span::styled(timer.subject_name.clone(), timer.style),
			]),
			Line::from(Span::styled(
				timer.elapsed.clone(),
				Style::default().fg(FOCUSED_BORDER_COLOR).add_modifier(Modifier::BOLD),
			)),
			Line::from("enter/space stop"),
		],
		None => vec![
			Line::from("idle"),
			Line::from("enter/space start on the selected subject"),
			Line::from("m log manual time"),
		],
	};
	let timer_panel = Paragraph::new(timer_lines).block(panel_block("Timer", view.timer.is_some()));
	frame.render_widget(timer_panel, layout[2]);
}

fn render_log(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(3), Constraint::Min(4)])
		.split(area);

	let header = Paragraph::new(Line::from(format!(
		"{} | total {}",
		app.selected_day.format("%A, %d %B %Y"),
		format_duration(view.day_total)
	)))
	.block(panel_block("Log", true));
	frame.render_widget(header, layout[0]);

	let items = view
		.day_rows
		.iter()
		.map(|row| {
			let mut spans = vec![
				Span::raw(format!(
					"{} | ",
					row.logged_at.with_timezone(&Local).format("%H:%M")
				)),
				Span::styled(row.subject_name.clone(), row.subject_style),
				Span::raw(format!(" | {}", format_duration(row.duration_seconds))),
			];
			match &row.goal_name {
				Some(goal_name) => spans.push(Span::raw(format!(" | goal: {goal_name}"))),
				None => spans.push(Span::styled(" | no goal", Style::default().fg(Color::DarkGray))),
			}
			if let Some(notes) = &row.notes {
				spans.push(Span::raw(format!(" | {notes}")));
			}
			ListItem::new(Line::from(spans))
		})
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !view.day_rows.is_empty() {
		state.select(Some(app.log_index.min(view.day_rows.len() - 1)));
	}

	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(no activity logged for this day)")]
	} else {
		items
	})
	.block(panel_block("Sessions", false))
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));
	frame.render_stateful_widget(list, layout[1], &mut state);
}

fn render_goals(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = view
		.goal_rows
		.iter()
		.map(|row| ListItem::new(goal_lines(row)))
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !view.goal_rows.is_empty() {
		state.select(Some(app.goals_index.min(view.goal_rows.len() - 1)));
	}

	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(no goals set yet, press n to create one)")]
	} else {
		items
	})
	.block(panel_block("Goals", true))
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));
	frame.render_stateful_widget(list, area, &mut state);
}

fn goal_lines(row: &GoalRow) -> Vec<Line<'static>> {
	let mut title_spans = vec![Span::styled(
		row.name.clone(),
		Style::default().add_modifier(Modifier::BOLD),
	)];
	if row.progress.is_complete {
		title_spans.push(Span::styled(
			" [done]",
			Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD),
		));
	} else if row.progress.is_expired {
		title_spans.push(Span::styled(
			" [expired]",
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		));
	}
	if let Some(description) = &row.description {
		title_spans.push(Span::styled(
			format!(" - {description}"),
			Style::default().fg(Color::Gray),
		));
	}

	let progress_line = match (row.progress.percentage, row.target_hours) {
		(Some(percentage), Some(target_hours)) => {
			let filled = (percentage / 100.0 * GOAL_BAR_WIDTH as f64).round() as usize;
			let bar_color = if row.progress.is_complete {
				Color::LightGreen
			} else {
				Color::LightBlue
			};
			Line::from(vec![
				Span::styled(
					"=".repeat(filled.min(GOAL_BAR_WIDTH)),
					Style::default().fg(bar_color),
				),
				Span::styled(
					".".repeat(GOAL_BAR_WIDTH - filled.min(GOAL_BAR_WIDTH)),
					Style::default().fg(Color::DarkGray),
				),
				Span::raw(format!(
					" {} spent | {:.0}% of {target_hours}h",
					format_duration(row.progress.progress_seconds),
					percentage
				)),
			])
		}
		_ => Line::from(format!(
			"{} spent | no target",
			format_duration(row.progress.progress_seconds)
		)),
	};

	let deadline_text = if row.progress.days_left < 0 {
		format!("ended {}", row.deadline.format("%Y-%m-%d"))
	} else {
		format!(
			"{} days left | {}",
			row.progress.days_left,
			row.deadline.format("%Y-%m-%d")
		)
	};

	vec![
		Line::from(title_spans),
		progress_line,
		Line::from(Span::styled(
			format!("{deadline_text} | subjects: {}", row.linked_names),
			Style::default().fg(Color::Gray),
		)),
		Line::from(""),
	]
}

fn render_stats(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let columns = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
		.split(area);

	let left = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(10), Constraint::Min(4)])
		.split(columns[0]);

	render_trend_panel(frame, left[0], &view.trend);
	render_top_days_panel(frame, left[1], &view.top_day_rows);
	render_distribution_panel(frame, columns[1], &view.distribution);
}

fn render_trend_panel(frame: &mut Frame, area: Rect, trend: &[TrendDay]) {
	let max_hours = trend.iter().map(|day| day.hours).fold(0.0_f64, f64::max).max(0.1);

	let mut lines = Vec::new();
	for day in trend {
		let width = ((day.hours / max_hours) * TREND_BAR_WIDTH as f64).round() as usize;
		let bar = "=".repeat(width);
		lines.push(Line::from(format!(
			"{} {:>5.1}h {}",
			day.date.format("%a"),
			day.hours,
			bar
		)));
	}

	let panel = Paragraph::new(lines).block(panel_block("Last 7 Days", true));
	frame.render_widget(panel, area);
}

fn render_top_days_panel(frame: &mut Frame, area: Rect, top_day_rows: &[(NaiveDate, i64)]) {
	let mut lines = Vec::new();
	if top_day_rows.is_empty() {
		lines.push(Line::from("(no sessions yet)"));
	}
	for (index, (date, total)) in top_day_rows.iter().enumerate() {
		lines.push(Line::from(format!(
			"{:>2}. {} | {}",
			index + 1,
			date.format("%Y-%m-%d"),
			format_duration(*total)
		)));
	}

	let panel = Paragraph::new(lines).block(panel_block("Most Productive Days", false));
	frame.render_widget(panel, area);
}

fn render_distribution_panel(frame: &mut Frame, area: Rect, distribution: &[SubjectTotal]) {
	let max_total = distribution
		.iter()
		.map(|entry| entry.total_seconds)
		.max()
		.unwrap_or(0)
		.max(1);

	let mut lines = Vec::new();
	// Bars only for subjects with logged time; the ranked list keeps zeros.
	for entry in distribution.iter().filter(|entry| entry.total_seconds > 0) {
		let width = ((entry.total_seconds as f64 / max_total as f64) * TREND_BAR_WIDTH as f64)
			.round() as usize;
		lines.push(Line::from(vec![
			Span::styled(
				"=".repeat(width.max(1)),
				style_from_subject_color(&entry.color),
			),
			Span::raw(format!(" {} | {}", entry.name, format_duration(entry.total_seconds))),
		]));
	}
	if lines.is_empty() {
		lines.push(Line::from("(no sessions yet)"));
	}

	lines.push(Line::from(""));
	lines.push(Line::from("Top Subjects"));
	for (index, entry) in distribution.iter().enumerate() {
		lines.push(Line::from(vec![
			Span::raw(format!("{:>2}. ", index + 1)),
			Span::styled(entry.name.clone(), style_from_subject_color(&entry.color)),
			Span::raw(format!(" | {}", format_duration(entry.total_seconds))),
		]));
	}

	let panel = Paragraph::new(lines).block(panel_block("Subject Distribution", false));
	frame.render_widget(panel, area);
}

fn render_settings(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Length(2 + view.user_rows.len().max(1) as u16),
			Constraint::Min(4),
			Constraint::Length(5),
		])
		.split(area);

	let user_items = view
		.user_rows
		.iter()
		.map(|row| {
			let marker = if row.is_current { "*" } else { " " };
			let style = if row.is_current {
				Style::default().fg(FOCUSED_BORDER_COLOR).add_modifier(Modifier::BOLD)
			} else {
				Style::default()
			};
			ListItem::new(Line::from(Span::styled(
				format!("{marker} {}", row.name),
				style,
			)))
		})
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !view.user_rows.is_empty() {
		state.select(Some(app.settings_index.min(view.user_rows.len() - 1)));
	}

	let users = List::new(user_items)
		.block(panel_block("Active User", true))
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));
	frame.render_stateful_widget(users, layout[0], &mut state);

	let subject_lines = view
		.subject_rows
		.iter()
		.map(|row| {
			Line::from(vec![
				Span::styled("# ", style_from_subject_color(&row.color)),
				Span::raw(row.name.clone()),
			])
		})
		.collect::<Vec<_>>();
	let subjects = Paragraph::new(if subject_lines.is_empty() {
		vec![Line::from("(no subjects)")]
	} else {
		subject_lines
	})
	.block(panel_block("Subjects (a to add)", false));
	frame.render_widget(subjects, layout[1]);

	let data_lines = vec![
		Line::from(format!("data file: {}", view.data_path)),
		Line::from(format!(
			"share url: {}",
			app.share_url.as_deref().unwrap_or("(not set)")
		)),
		Line::from("e export backup | u edit share url"),
	];
	let data_panel = Paragraph::new(data_lines).block(panel_block("Data", false));
	frame.render_widget(data_panel, layout[2]);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("tab/1-5 switch view | j/k move | q quit"),
			Line::from(app.view.key_hints()),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k move | Enter choose | Esc cancel"),
		],
		InputMode::MultiSelect(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!("{} selected (empty means all)", select.selected_count())),
			Line::from("j/k move | space toggle | Enter confirm | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(62, 55, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let list = List::new(items)
		.block(Block::default().borders(Borders::ALL).title(select.title.clone()))
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len() - 1)));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn render_multi_select_popup(frame: &mut Frame, select: &MultiSelectState) {
	let area = centered_rect(62, 55, frame.area());
	frame.render_widget(Clear, area);

	let items = select
		.options
		.iter()
		.map(|option| {
			let marker = if option.selected { "[x]" } else { "[ ]" };
			ListItem::new(Line::from(vec![
				Span::raw(format!("{marker} ")),
				Span::styled(option.label.clone(), option.style),
			]))
		})
		.collect::<Vec<_>>();

	let list = List::new(items)
		.block(Block::default().borders(Borders::ALL).title(select.title.clone()))
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.cursor.min(select.options.len() - 1)));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(app: &mut App, code: KeyCode, store: &mut Store, view: &ViewModel) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => return true,
		KeyCode::Tab => {
			app.view = app.view.next();
			return false;
		}
		KeyCode::BackTab => {
			app.view = app.view.prev();
			return false;
		}
		KeyCode::Char(value) if value.is_ascii_digit() => {
			if let Some(next_view) = View::from_digit(value) {
				app.view = next_view;
			}
			return false;
		}
		KeyCode::Up | KeyCode::Char('k') => {
			app.move_selection(-1, view);
			return false;
		}
		KeyCode::Down | KeyCode::Char('j') => {
			app.move_selection(1, view);
			return false;
		}
		_ => {}
	}

	match app.view {
		View::Today => handle_today_key(app, code, store, view),
		View::Log => handle_log_key(app, code, view),
		View::Goals => handle_goals_key(app, code),
		View::Stats => {}
		View::Settings => handle_settings_key(app, code, store, view),
	}

	false
}

fn handle_today_key(app: &mut App, code: KeyCode, store: &mut Store, view: &ViewModel) {
	match code {
		KeyCode::Enter | KeyCode::Char(' ') => {
			let now = Utc::now();
			if app.timer.is_running() {
				app.status = match app.timer.stop(now) {
					Some(finished) => commit_session(
						store,
						finished.subject_id,
						finished.duration_seconds,
						finished.goal_id,
						now,
					),
					None => format!("discarded session shorter than {MIN_SESSION_SECONDS} seconds"),
				};
				return;
			}

			let Some(row) = view.subject_rows.get(app.today_index) else {
				app.status = "no subject selected".to_string();
				return;
			};
			app.timer.start(row.subject_id.clone(), None, now);
			app.status = format!("started timer: {}", row.name);
		}
		KeyCode::Char('m') => {
			let Some(row) = view.subject_rows.get(app.today_index) else {
				app.status = "no subject selected".to_string();
				return;
			};
			app.mode = InputMode::Prompt(PromptState::new(
				format!("Duration for {} (e.g. 1:30, 90, 2h)", row.name),
				PromptKind::ManualDuration {
					subject_id: row.subject_id.clone(),
				},
			));
		}
		_ => {}
	}
}

fn handle_log_key(app: &mut App, code: KeyCode, view: &ViewModel) {
	match code {
		KeyCode::Left | KeyCode::Char('h') => {
			app.selected_day -= Duration::days(1);
			app.log_index = 0;
		}
		KeyCode::Right | KeyCode::Char('l') => {
			app.selected_day += Duration::days(1);
			app.log_index = 0;
		}
		KeyCode::Char('t') => {
			app.selected_day = Utc::now().date_naive();
			app.log_index = 0;
		}
		KeyCode::Char('d') => {
			let Some(row) = view.day_rows.get(app.log_index) else {
				app.status = "no session selected".to_string();
				return;
			};
			app.mode = InputMode::Select(build_delete_session_select(row));
		}
		_ => {}
	}
}

fn handle_goals_key(app: &mut App, code: KeyCode) {
	if code == KeyCode::Char('n') {
		app.mode = InputMode::Prompt(PromptState::new("Goal name", PromptKind::GoalName));
	}
}

fn handle_settings_key(app: &mut App, code: KeyCode, store: &mut Store, view: &ViewModel) {
	match code {
		KeyCode::Enter => {
			let Some(row) = view.user_rows.get(app.settings_index) else {
				return;
			};
			if row.is_current {
				app.status = format!("already active: {}", row.name);
				return;
			}
			let user_id = row.user_id.clone();
			store.update(|data| data.switch_user(&user_id));
			// Switching the profile drops any running timer.
			app.timer.reset();
			app.reset_indices();
			app.status = format!("switched to {}", row.name);
		}
		KeyCode::Char('a') => {
			app.mode = InputMode::Prompt(PromptState::new("New subject name", PromptKind::SubjectName));
		}
		KeyCode::Char('e') => {
			let out_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
			let today = Utc::now().date_naive();
			app.status = match export_data(store.data(), &out_dir, today) {
				Ok(path) => format!("exported to {}", path.display()),
				Err(err) => format!("error: {err}"),
			};
		}
		KeyCode::Char('u') => {
			let mut prompt = PromptState::new("Public share URL", PromptKind::ShareUrl);
			if let Some(url) = &app.share_url {
				prompt.input = url.clone();
			}
			app.mode = InputMode::Prompt(prompt);
		}
		_ => {}
	}
}

fn handle_prompt_key(app: &mut App, code: KeyCode, store: &mut Store, data_dir: &Path) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				other => {
					app.mode = other;
					return false;
				}
			};

			match submit_prompt(prompt.clone(), store, data_dir) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => app.mode = InputMode::Prompt(next_prompt),
				Ok(PromptOutcome::Select(select)) => app.mode = InputMode::Select(select),
				Ok(PromptOutcome::MultiSelect(select)) => app.mode = InputMode::MultiSelect(select),
				Ok(PromptOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Ok(PromptOutcome::ShareUrlSaved(url)) => {
					app.mode = InputMode::Normal;
					app.status = format!("share url saved: {url}");
					app.share_url = Some(url);
				}
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(app: &mut App, code: KeyCode, store: &mut Store) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				other => {
					app.mode = other;
					return false;
				}
			};

			match submit_select(select.clone(), store) {
				Ok(message) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_multi_select_key(app: &mut App, code: KeyCode, store: &mut Store) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "input cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::MultiSelect(select) = &mut app.mode {
				select.move_cursor(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::MultiSelect(select) = &mut app.mode {
				select.move_cursor(1);
			}
		}
		KeyCode::Char(' ') => {
			if let InputMode::MultiSelect(select) = &mut app.mode {
				select.toggle_current();
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::MultiSelect(select) => select,
				other => {
					app.mode = other;
					return false;
				}
			};

			app.status = submit_multi_select(select, store);
			app.mode = InputMode::Normal;
		}
		_ => {}
	}

	false
}

fn submit_prompt(
	prompt: PromptState,
	store: &mut Store,
	data_dir: &Path,
) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::ManualDuration { subject_id } => {
			let seconds = parse_duration_input(&prompt.input);
			if seconds <= 0 {
				return Err(format!("could not parse duration '{}'", prompt.input.trim()));
			}

			let eligible = store
				.data()
				.current_user()
				.goals_for_subject(&subject_id)
				.iter()
				.map(|goal| (goal.id.clone(), goal.name.clone()))
				.collect::<Vec<_>>();
			if eligible.is_empty() {
				return Ok(PromptOutcome::Done(commit_session(
					store,
					subject_id,
					seconds,
					None,
					Utc::now(),
				)));
			}

			Ok(PromptOutcome::Select(build_session_goal_select(
				subject_id, seconds, eligible,
			)))
		}
		PromptKind::GoalName => {
			let name = required_text(&prompt.input, "goal name")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Deadline (YYYY-MM-DD)",
				PromptKind::GoalDeadline { name },
			)))
		}
		PromptKind::GoalDeadline { name } => {
			let raw = required_text(&prompt.input, "deadline")?;
			let deadline = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
				.map_err(|_| format!("invalid date '{raw}', expected YYYY-MM-DD"))?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Target hours (optional)",
				PromptKind::GoalTargetHours { name, deadline },
			)))
		}
		PromptKind::GoalTargetHours { name, deadline } => {
			let target_hours = optional_text(&prompt.input)
				.and_then(|raw| raw.parse::<f64>().ok())
				.filter(|value| *value > 0.0);
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Description (optional)",
				PromptKind::GoalDescription {
					name,
					deadline,
					target_hours,
				},
			)))
		}
		PromptKind::GoalDescription {
			name,
			deadline,
			target_hours,
		} => {
			let description = optional_text(&prompt.input);
			Ok(PromptOutcome::MultiSelect(build_goal_subjects_select(
				store,
				name,
				deadline,
				target_hours,
				description,
			)))
		}
		PromptKind::SubjectName => {
			let name = required_text(&prompt.input, "subject name")?;
			let created_name = name.clone();
			store.update(|data| data.add_subject(name));
			Ok(PromptOutcome::Done(format!("created subject: {created_name}")))
		}
		PromptKind::ShareUrl => {
			let url = required_text(&prompt.input, "share url")?;
			save_share_url(data_dir, &url).map_err(|err| err.to_string())?;
			Ok(PromptOutcome::ShareUrlSaved(url))
		}
	}
}

fn submit_select(select: SelectState, store: &mut Store) -> Result<String, String> {
	let selected_value = select
		.selected_option()
		.map(|option| option.value.clone())
		.ok_or_else(|| "no option selected".to_string())?;

	match select.kind {
		SelectKind::SessionGoal {
			subject_id,
			duration_seconds,
		} => Ok(commit_session(
			store,
			subject_id,
			duration_seconds,
			selected_value,
			Utc::now(),
		)),
		SelectKind::DeleteSessionConfirm { session_id, label } => {
			if selected_value.as_deref() != Some("delete") {
				return Ok("delete cancelled".to_string());
			}
			if store.update(|data| data.delete_session(&session_id)) {
				Ok(format!("deleted session: {label}"))
			} else {
				Ok("session was already removed".to_string())
			}
		}
	}
}

fn submit_multi_select(select: MultiSelectState, store: &mut Store) -> String {
	let chosen = select
		.options
		.iter()
		.filter(|option| option.selected)
		.map(|option| option.value.clone())
		.collect::<Vec<_>>();

	match select.kind {
		MultiSelectKind::GoalSubjects {
			name,
			deadline,
			target_hours,
			description,
		} => {
			let created_name = name.clone();
			store.update(|data| {
				let subjects = data.current_user().subjects.clone();
				let goal = Goal::create(name, description, deadline, chosen, target_hours, &subjects);
				data.add_goal(goal);
			});
			format!("created goal: {created_name}")
		}
	}
}

fn commit_session(
	store: &mut Store,
	subject_id: String,
	duration_seconds: i64,
	goal_id: Option<String>,
	now: DateTime<Utc>,
) -> String {
	let subject_name = store
		.data()
		.current_user()
		.subject(&subject_id)
		.map(|subject| subject.name.clone())
		.unwrap_or_else(|| "Unknown subject".to_string());

	let session = Session {
		id: generate_id(),
		subject_id,
		date: now.date_naive(),
		duration_seconds,
		goal_id,
		notes: None,
		timestamp: now,
	};
	store.update(|data| data.add_session(session));

	format!("logged {} to {subject_name}", format_duration(duration_seconds))
}

fn build_session_goal_select(
	subject_id: String,
	duration_seconds: i64,
	eligible: Vec<(String, String)>,
) -> SelectState {
	let mut options = vec![SelectOption::new(
		"No goal",
		None,
		Style::default().fg(Color::Gray),
	)];
	for (goal_id, goal_name) in eligible {
		options.push(SelectOption::new(goal_name, Some(goal_id), Style::default()));
	}

	SelectState::new(
		"Count this time toward a goal?",
		SelectKind::SessionGoal {
			subject_id,
			duration_seconds,
		},
		options,
	)
}

fn build_delete_session_select(row: &SessionRow) -> SelectState {
	let label = format!(
		"{} ({})",
		row.subject_name,
		format_duration(row.duration_seconds)
	);
	let options = vec![
		SelectOption::new(
			"Delete",
			Some("delete".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new(
		format!("Delete session? {label}"),
		SelectKind::DeleteSessionConfirm {
			session_id: row.session_id.clone(),
			label,
		},
		options,
	);
	// Default to cancel.
	select.selected = 1;
	select
}

fn build_goal_subjects_select(
	store: &Store,
	name: String,
	deadline: NaiveDate,
	target_hours: Option<f64>,
	description: Option<String>,
) -> MultiSelectState {
	let options = store
		.data()
		.current_user()
		.subjects
		.iter()
		.map(|subject| MultiSelectOption {
			label: subject.name.clone(),
			value: subject.id.clone(),
			style: style_from_subject_color(&subject.color),
			selected: false,
		})
		.collect::<Vec<_>>();

	MultiSelectState {
		title: "Link subjects (empty selection links all)".to_string(),
		options,
		cursor: 0,
		kind: MultiSelectKind::GoalSubjects {
			name,
			deadline,
			target_hours,
			description,
		},
	}
}

fn build_view(app: &App, store: &Store, now: DateTime<Utc>) -> ViewModel {
	let today = now.date_naive();
	let data = store.data();
	let user = data.current_user();

	let subject_rows = user
		.subjects
		.iter()
		.map(|subject| SubjectRow {
			subject_id: subject.id.clone(),
			name: subject.name.clone(),
			color: subject.color.clone(),
			style: style_from_subject_color(&subject.color),
			today_seconds: total_for_subject_on_date(&user.sessions, &subject.id, today),
			is_running: app.timer.subject_id() == Some(subject.id.as_str()),
		})
		.collect::<Vec<_>>();

	let mut day_rows = user
		.sessions
		.iter()
		.filter(|session| session.date == app.selected_day)
		.map(|session| {
			let subject = user.subject(&session.subject_id);
			SessionRow {
				session_id: session.id.clone(),
				subject_name: subject
					.map(|subject| subject.name.clone())
					.unwrap_or_else(|| "Unknown subject".to_string()),
				subject_style: subject
					.map(|subject| style_from_subject_color(&subject.color))
					.unwrap_or_default(),
				goal_name: session
					.goal_id
					.as_ref()
					.and_then(|goal_id| user.goal(goal_id))
					.map(|goal| goal.name.clone()),
				notes: session.notes.clone(),
				duration_seconds: session.duration_seconds,
				logged_at: session.timestamp,
			}
		})
		.collect::<Vec<_>>();
	day_rows.sort_by(|left, right| right.logged_at.cmp(&left.logged_at));

	let goal_rows = user
		.goals
		.iter()
		.map(|goal| GoalRow {
			name: goal.name.clone(),
			description: goal.description.clone(),
			deadline: goal.deadline,
			target_hours: goal.target_hours,
			linked_names: linked_subject_names(user, goal),
			progress: goal_progress(goal, &user.sessions, today),
		})
		.collect::<Vec<_>>();

	let timer = match &app.timer {
		TimerState::Idle => None,
		TimerState::Running { subject_id, .. } => {
			let subject = user.subject(subject_id);
			Some(TimerView {
				subject_name: subject
					.map(|subject| subject.name.clone())
					.unwrap_or_else(|| "Unknown subject".to_string()),
				style: subject
					.map(|subject| style_from_subject_color(&subject.color))
					.unwrap_or_default(),
				elapsed: format_duration_digital(app.timer.elapsed_seconds(now)),
			})
		}
	};

	ViewModel {
		today,
		today_total: total_for_date(&user.sessions, today),
		subject_rows,
		day_total: total_for_date(&user.sessions, app.selected_day),
		day_rows,
		goal_rows,
		trend: seven_day_trend(&user.sessions, today),
		distribution: subject_distribution(&user.subjects, &user.sessions),
		top_day_rows: top_days(&user.sessions, 5),
		user_rows: data
			.users
			.iter()
			.map(|candidate| UserRow {
				user_id: candidate.id.clone(),
				name: candidate.name.clone(),
				is_current: candidate.id == user.id,
			})
			.collect(),
		data_path: store.path().display().to_string(),
		timer,
	}
}

fn linked_subject_names(user: &UserData, goal: &Goal) -> String {
	let names = goal
		.linked_subject_ids
		.iter()
		.filter_map(|subject_id| user.subject(subject_id))
		.map(|subject| subject.name.as_str())
		.collect::<Vec<_>>();
	if names.is_empty() {
		"(none)".to_string()
	} else {
		names.join(", ")
	}
}

fn style_from_subject_color(hex: &str) -> Style {
	color_from_hex(hex)
		.map(|color| Style::default().fg(color))
		.unwrap_or_default()
}

fn color_from_hex(hex: &str) -> Option<Color> {
	let digits = hex.strip_prefix('#')?;
	if digits.len() != 6 {
		return None;
	}
	let value = u32::from_str_radix(digits, 16).ok()?;
	Some(Color::Rgb(
		(value >> 16) as u8,
		(value >> 8) as u8,
		value as u8,
	))
}

fn panel_block(title: &str, focused: bool) -> Block<'static> {
	let border_style = if focused {
		Style::default().fg(FOCUSED_BORDER_COLOR)
	} else {
		Style::default().fg(PANEL_BORDER_COLOR)
	};
	Block::default()
		.borders(Borders::ALL)
		.title(title.to_string())
		.border_style(border_style)
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		Err(format!("{field_name} is required"))
	} else {
		Ok(value.to_string())
	}
}

fn optional_text(input: &str) -> Option<String> {
	let value = input.trim();
	if value.is_empty() {
		None
	} else {
		Some(value.to_string())
	}
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Select(SelectState),
	MultiSelect(MultiSelectState),
	Done(String),
	ShareUrlSaved(String),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	ManualDuration {
		subject_id: String,
	},
	GoalName,
	GoalDeadline {
		name: String,
	},
	GoalTargetHours {
		name: String,
		deadline: NaiveDate,
	},
	GoalDescription {
		name: String,
		deadline: NaiveDate,
		target_hours: Option<f64>,
	},
	SubjectName,
	ShareUrl,
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: Option<String>,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: Option<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

#[derive(Debug, Clone)]
enum SelectKind {
	SessionGoal {
		subject_id: String,
		duration_seconds: i64,
	},
	DeleteSessionConfirm {
		session_id: String,
		label: String,
	},
}

#[derive(Debug, Clone)]
struct MultiSelectState {
	title: String,
	options: Vec<MultiSelectOption>,
	cursor: usize,
	kind: MultiSelectKind,
}

impl MultiSelectState {
	fn move_cursor(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.cursor = 0;
			return;
		}

		if delta > 0 {
			self.cursor = (self.cursor + delta as usize).min(self.options.len() - 1);
		} else {
			self.cursor = self.cursor.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn toggle_current(&mut self) {
		if let Some(option) = self.options.get_mut(self.cursor) {
			option.selected = !option.selected;
		}
	}

	fn selected_count(&self) -> usize {
		self.options.iter().filter(|option| option.selected).count()
	}
}

#[derive(Debug, Clone)]
struct MultiSelectOption {
	label: String,
	value: String,
	style: Style,
	selected: bool,
}

#[derive(Debug, Clone)]
enum MultiSelectKind {
	GoalSubjects {
		name: String,
		deadline: NaiveDate,
		target_hours: Option<f64>,
		description: Option<String>,
	},
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
	MultiSelect(MultiSelectState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
	Today,
	Log,
	Goals,
	Stats,
	Settings,
}

impl View {
	const ALL: [View; 5] = [View::Today, View::Log, View::Goals, View::Stats, View::Settings];

	fn title(self) -> &'static str {
		match self {
			View::Today => "Today",
			View::Log => "Log",
			View::Goals => "Goals",
			View::Stats => "Stats",
			View::Settings => "Settings",
		}
	}

	fn key_hints(self) -> &'static str {
		match self {
			View::Today => "enter/space start/stop timer | m log manual time",
			View::Log => "h/l previous/next day | t today | d delete session",
			View::Goals => "n new goal",
			View::Stats => "",
			View::Settings => "enter switch user | a add subject | e export | u share url",
		}
	}

	fn index(self) -> usize {
		View::ALL
			.iter()
			.position(|view| *view == self)
			.expect("view must be listed")
	}

	fn from_digit(digit: char) -> Option<View> {
		let index = digit.to_digit(10)? as usize;
		if index == 0 {
			return None;
		}
		View::ALL.get(index - 1).copied()
	}

	fn next(self) -> View {
		View::ALL[(self.index() + 1) % View::ALL.len()]
	}

	fn prev(self) -> View {
		View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
	}
}

struct App {
	view: View,
	timer: TimerState,
	selected_day: NaiveDate,
	today_index: usize,
	log_index: usize,
	goals_index: usize,
	settings_index: usize,
	share_url: Option<String>,
	mode: InputMode,
	status: String,
}

impl App {
	fn new(share_url: Option<String>) -> Self {
		Self {
			view: View::Today,
			timer: TimerState::Idle,
			selected_day: Utc::now().date_naive(),
			today_index: 0,
			log_index: 0,
			goals_index: 0,
			settings_index: 0,
			share_url,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}

	fn reset_indices(&mut self) {
		self.today_index = 0;
		self.log_index = 0;
		self.goals_index = 0;
	}

	fn move_selection(&mut self, delta: i32, view: &ViewModel) {
		let (index, len) = match self.view {
			View::Today => (&mut self.today_index, view.subject_rows.len()),
			View::Log => (&mut self.log_index, view.day_rows.len()),
			View::Goals => (&mut self.goals_index, view.goal_rows.len()),
			View::Settings => (&mut self.settings_index, view.user_rows.len()),
			View::Stats => return,
		};

		if len == 0 {
			*index = 0;
			return;
		}

		if delta > 0 {
			*index = (*index + delta as usize).min(len - 1);
		} else {
			*index = index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn clamp_selection(&mut self, view: &ViewModel) {
		self.today_index = clamp_index(self.today_index, view.subject_rows.len());
		self.log_index = clamp_index(self.log_index, view.day_rows.len());
		self.goals_index = clamp_index(self.goals_index, view.goal_rows.len());
		self.settings_index = clamp_index(self.settings_index, view.user_rows.len());
	}
}

fn clamp_index(index: usize, len: usize) -> usize {
	if len == 0 { 0 } else { index.min(len - 1) }
}

struct ViewModel {
	today: NaiveDate,
	today_total: i64,
	subject_rows: Vec<SubjectRow>,
	day_total: i64,
	day_rows: Vec<SessionRow>,
	goal_rows: Vec<GoalRow>,
	trend: Vec<TrendDay>,
	distribution: Vec<SubjectTotal>,
	top_day_rows: Vec<(NaiveDate, i64)>,
	user_rows: Vec<UserRow>,
	data_path: String,
	timer: Option<TimerView>,
}

struct SubjectRow {
	subject_id: String,
	name: String,
	color: String,
	style: Style,
	today_seconds: i64,
	is_running: bool,
}

struct SessionRow {
	session_id: String,
	subject_name: String,
	subject_style: Style,
	goal_name: Option<String>,
	notes: Option<String>,
	duration_seconds: i64,
	logged_at: DateTime<Utc>,
}

struct GoalRow {
	name: String,
	description: Option<String>,
	deadline: NaiveDate,
	target_hours: Option<f64>,
	linked_names: String,
	progress: GoalProgress,
}

struct TimerView {
	subject_name: String,
	style: Style,
	elapsed: String,
}

struct UserRow {
	user_id: String,
	name: String,
	is_current: bool,
}

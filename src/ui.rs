use crate::app::{App, FormField, Mode};
use crate::filter::Filter;
use crate::notice::NoticeLevel;
use crate::task::{format_due_date, Priority, Task};
use crate::theme::{hex_color, Palette};
use chrono::{Datelike, Local, NaiveDate, Timelike};
use crossterm::event::{self, Event};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(250);

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        // Poll with a timeout so expired notices disappear without a keypress.
        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

pub fn greeting(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    }
}

/// "Friday, October 16th"
pub fn format_today(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}{}", date.format("%A, %B "), day, suffix)
}

pub fn draw(f: &mut Frame, app: &App) {
    let palette = Palette::for_mode(app.dark_mode);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, app, &palette, chunks[0]);
    draw_filters(f, app, &palette, chunks[1]);
    draw_search(f, app, &palette, chunks[2]);
    draw_tasks(f, app, &palette, chunks[3]);
    draw_footer(f, app, &palette, chunks[4]);

    if matches!(app.mode, Mode::Adding | Mode::Editing) {
        draw_form(f, app, &palette);
    }
}

fn draw_header(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let now = Local::now();
    let stats = app.store.stats();
    let lines = vec![
        Line::from(vec![
            Span::styled(
                "TaskTide",
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}! Today is {}", greeting(now.hour()), format_today(now.date_naive())),
                Style::default().fg(palette.muted),
            ),
        ]),
        Line::from(vec![
            Span::styled("Total ", Style::default().fg(palette.muted)),
            Span::styled(
                stats.total.to_string(),
                Style::default().fg(palette.fg).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   Completed ", Style::default().fg(palette.muted)),
            Span::styled(
                stats.completed.to_string(),
                Style::default().fg(palette.success).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   Pending ", Style::default().fg(palette.muted)),
            Span::styled(
                stats.pending.to_string(),
                Style::default().fg(palette.warning).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    let header = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(palette.border)),
    );
    f.render_widget(header, area);
}

fn draw_filters(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let categories = app.store.categories();
    let choices = Filter::choices(categories);
    let selected = choices.iter().position(|c| *c == app.filter).unwrap_or(0);
    let titles: Vec<String> = choices.iter().map(|c| c.label(categories)).collect();
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(palette.muted))
        .highlight_style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .title("Filter (f/F)")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        );
    f.render_widget(tabs, area);
}

fn draw_search(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let searching = app.mode == Mode::Searching;
    let mut spans = vec![
        Span::styled(" Search: ", Style::default().fg(palette.muted)),
        Span::styled(app.search.as_str(), Style::default().fg(palette.fg)),
    ];
    if searching {
        spans.push(Span::styled("_", Style::default().fg(palette.accent)));
    } else if app.search.is_empty() {
        spans.push(Span::styled("press / to search", Style::default().fg(palette.muted)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_tasks(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let today = Local::now().date_naive();
    let tasks = app.visible_tasks();
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|t| task_item(app, t, palette, today))
        .collect();

    if tasks.is_empty() {
        let (headline, hint) = empty_message(&app.filter, &app.search);
        let empty = Paragraph::new(vec![
            Line::from(Span::styled(headline, Style::default().fg(palette.fg))),
            Line::from(Span::styled(hint, Style::default().fg(palette.muted))),
        ])
        .block(
            Block::default()
                .title("Tasks (0)")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        );
        f.render_widget(empty, area);
        return;
    }

    let title = format!("Tasks ({})", tasks.len());
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(if app.mode == Mode::Normal {
                    Style::default().fg(palette.accent)
                } else {
                    Style::default().fg(palette.border)
                }),
        )
        .highlight_style(Style::default().bg(palette.highlight_bg).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn empty_message(filter: &Filter, search: &str) -> (&'static str, &'static str) {
    let headline = if !search.is_empty() {
        "No matching tasks found"
    } else {
        match filter {
            Filter::Completed => "No completed tasks yet",
            Filter::Active => "No active tasks",
            _ => "No tasks yet",
        }
    };
    let hint = if search.is_empty() {
        "Press a to add a new task"
    } else {
        "Try a different search term"
    };
    (headline, hint)
}

fn task_item<'a>(app: &App, task: &'a Task, palette: &Palette, today: NaiveDate) -> ListItem<'a> {
    let check = if task.is_completed { "[x] " } else { "[ ] " };
    let title_style = if task.is_completed {
        Style::default().fg(palette.muted).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(palette.fg)
    };

    let mut spans = vec![
        Span::styled(check, Style::default().fg(palette.success)),
        Span::styled(task.title.as_str(), title_style),
        Span::raw("  "),
        Span::styled(
            format!("[{}]", task.priority.label()),
            Style::default().fg(priority_color(task.priority, palette)),
        ),
    ];

    if !task.category.is_empty() {
        let category = app.store.category_info(&task.category);
        let name = if category.name.is_empty() {
            "Unknown".to_string()
        } else {
            category.name
        };
        let color = hex_color(&category.color).unwrap_or(palette.muted);
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!("#{name}"), Style::default().fg(color)));
    }

    if task.due_date.is_some() {
        let style = if task.is_overdue(today) {
            Style::default().fg(palette.error)
        } else {
            Style::default().fg(palette.muted)
        };
        spans.push(Span::styled(
            format!("  (Due: {})", format_due_date(task.due_date)),
            style,
        ));
    }

    let mut lines = vec![Line::from(spans)];
    if !task.description.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("    {}", task.description),
            Style::default().fg(palette.muted),
        )));
    }
    ListItem::new(lines)
}

fn priority_color(priority: Priority, palette: &Palette) -> ratatui::style::Color {
    match priority {
        Priority::Low => palette.success,
        Priority::Medium => palette.warning,
        Priority::High => palette.error,
    }
}

fn draw_footer(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let line = match app.notices.current() {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Success => palette.success,
                NoticeLevel::Info => palette.accent,
                NoticeLevel::Error => palette.error,
            };
            Line::from(Span::styled(
                format!(" {}", notice.message),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        }
        None => Line::from(Span::styled(help_text(app.mode), Style::default().fg(palette.muted))),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn help_text(mode: Mode) -> &'static str {
    match mode {
        Mode::Normal => {
            " a add  e edit  space toggle  d delete  / search  f filter  t theme  q quit"
        }
        Mode::Adding | Mode::Editing => {
            " tab next field  ←/→ change priority/category  enter save  esc cancel"
        }
        Mode::Searching => " type to search  enter done  esc clear",
    }
}

struct FormView<'a> {
    title: &'a str,
    description: &'a str,
    due_date: &'a str,
    priority: Priority,
    category: &'a str,
}

fn form_view(app: &App) -> Option<FormView<'_>> {
    match app.mode {
        Mode::Adding => Some(FormView {
            title: &app.form.title,
            description: &app.form.description,
            due_date: &app.form.due_date,
            priority: app.form.priority,
            category: &app.form.category,
        }),
        Mode::Editing => app.store.draft().map(|d| FormView {
            title: &d.title,
            description: &d.description,
            due_date: &d.due_date,
            priority: d.priority,
            category: &d.category,
        }),
        Mode::Normal | Mode::Searching => None,
    }
}

fn draw_form(f: &mut Frame, app: &App, palette: &Palette) {
    let Some(view) = form_view(app) else {
        return;
    };
    let category_label = if view.category.is_empty() {
        "No Category".to_string()
    } else {
        let info = app.store.category_info(view.category);
        if info.name.is_empty() {
            "Unknown".to_string()
        } else {
            info.name
        }
    };

    let mut lines = Vec::new();
    for field in FormField::ALL {
        let active = field == app.field;
        let value = match field {
            FormField::Title => format!("{}{}", view.title, if active { "_" } else { "" }),
            FormField::Description => {
                format!("{}{}", view.description, if active { "_" } else { "" })
            }
            FormField::DueDate => format!("{}{}", view.due_date, if active { "_" } else { "" }),
            FormField::Priority => format!("< {} >", view.priority.label()),
            FormField::Category => format!("< {} >", category_label),
        };
        let label_style = if active {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        lines.push(Line::from(Span::styled(field.label(), label_style)));
        lines.push(Line::from(Span::styled(
            format!("  {value}"),
            Style::default().fg(palette.fg),
        )));
    }

    let title = if app.mode == Mode::Editing {
        "Edit Task"
    } else {
        "Add New Task"
    };
    let area = centered_rect(60, 14, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent)),
        ),
        area,
    );
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(r);
    let side = (100 - percent_x.min(100)) / 2;
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(side),
            Constraint::Percentage(percent_x),
            Constraint::Percentage(side),
        ])
        .split(rows[1])[1]
}

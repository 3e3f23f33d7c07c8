use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use crate::error::TaskError;
use crate::filter::Filter;
use crate::notice::Notices;
use crate::task::{NewTask, Priority, Task};
use crate::task_store::TaskStore;
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Adding,
    Editing,
    Searching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    DueDate,
    Priority,
    Category,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Title,
        FormField::Description,
        FormField::DueDate,
        FormField::Priority,
        FormField::Category,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Description => "Description",
            FormField::DueDate => "Due date (YYYY-MM-DD)",
            FormField::Priority => "Priority",
            FormField::Category => "Category",
        }
    }

    fn step(self, forward: bool) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        let len = Self::ALL.len();
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        Self::ALL[next]
    }
}

/// Mutable view over whichever form is open: the add form or the staged edit.
pub struct FormRefs<'a> {
    pub title: &'a mut String,
    pub description: &'a mut String,
    pub due_date: &'a mut String,
    pub priority: &'a mut Priority,
    pub category: &'a mut String,
}

impl FormRefs<'_> {
    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Title => Some(&mut *self.title),
            FormField::Description => Some(&mut *self.description),
            FormField::DueDate => Some(&mut *self.due_date),
            FormField::Priority | FormField::Category => None,
        }
    }
}

pub struct App {
    pub store: TaskStore,
    pub form: NewTask,
    pub mode: Mode,
    pub field: FormField,
    pub filter: Filter,
    pub search: String,
    pub selected: usize,
    pub dark_mode: bool,
    pub notices: Notices,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: TaskStore, dark_mode: bool) -> Self {
        Self {
            store,
            form: NewTask::default(),
            mode: Mode::Normal,
            field: FormField::Title,
            filter: Filter::All,
            search: String::new(),
            selected: 0,
            dark_mode,
            notices: Notices::default(),
            should_quit: false,
        }
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.store.filtered_view(&self.filter, &self.search).collect()
    }

    pub fn selected_id(&self) -> Option<String> {
        self.store
            .filtered_view(&self.filter, &self.search)
            .nth(self.selected)
            .map(|t| t.id.clone())
    }

    pub fn form_refs(&mut self) -> Option<FormRefs<'_>> {
        match self.mode {
            Mode::Adding => {
                let f = &mut self.form;
                Some(FormRefs {
                    title: &mut f.title,
                    description: &mut f.description,
                    due_date: &mut f.due_date,
                    priority: &mut f.priority,
                    category: &mut f.category,
                })
            }
            Mode::Editing => self.store.draft_mut().map(|d| FormRefs {
                title: &mut d.title,
                description: &mut d.description,
                due_date: &mut d.due_date,
                priority: &mut d.priority,
                category: &mut d.category,
            }),
            Mode::Normal | Mode::Searching => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Adding | Mode::Editing => self.handle_form_key(key),
            Mode::Searching => self.handle_search_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('a') => {
                self.mode = Mode::Adding;
                self.field = FormField::Title;
            }
            KeyCode::Char('e') | KeyCode::Enter => self.begin_edit(),
            KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('/') => self.mode = Mode::Searching,
            KeyCode::Char('f') => self.cycle_filter(true),
            KeyCode::Char('F') => self.cycle_filter(false),
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected += 1;
                self.clamp_selection();
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.close_form(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab => self.field = self.field.step(true),
            KeyCode::BackTab => self.field = self.field.step(false),
            KeyCode::Left | KeyCode::Right => self.cycle_choice(key.code == KeyCode::Right),
            KeyCode::Backspace => {
                let field = self.field;
                if let Some(mut refs) = self.form_refs() {
                    if let Some(text) = refs.text_mut(field) {
                        text.pop();
                    }
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let field = self.field;
                if let Some(mut refs) = self.form_refs() {
                    if let Some(text) = refs.text_mut(field) {
                        text.push(c);
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.mode = Mode::Normal,
            KeyCode::Esc => {
                self.search.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                self.search.pop();
            }
            KeyCode::Char(c) => self.search.push(c),
            _ => return,
        }
        self.clamp_selection();
    }

    fn cycle_choice(&mut self, forward: bool) {
        let field = self.field;
        let mut options = vec![String::new()];
        options.extend(self.store.categories().iter().map(|c| c.id.clone()));
        let Some(refs) = self.form_refs() else {
            return;
        };
        match field {
            FormField::Priority => *refs.priority = refs.priority.cycle(forward),
            FormField::Category => {
                // A dangling id is treated as "no category" when cycling.
                let idx = options.iter().position(|o| *o == *refs.category).unwrap_or(0);
                let len = options.len();
                let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
                *refs.category = options[next].clone();
            }
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        match self.mode {
            Mode::Adding => match self.store.add_task(&mut self.form) {
                Ok(_) => {
                    self.notices.success("Task added successfully");
                    self.mode = Mode::Normal;
                    self.selected = 0;
                }
                Err(err) if err.is_validation() => self.notices.error(err.to_string()),
                Err(err) => {
                    self.mode = Mode::Normal;
                    self.report(err);
                }
            },
            Mode::Editing => match self.store.apply_edit() {
                Ok(Some(_)) => {
                    self.notices.success("Task updated");
                    self.mode = Mode::Normal;
                }
                Ok(None) => self.mode = Mode::Normal,
                Err(err) if err.is_validation() => self.notices.error(err.to_string()),
                Err(err) => {
                    self.mode = Mode::Normal;
                    self.report(err);
                }
            },
            Mode::Normal | Mode::Searching => {}
        }
        self.clamp_selection();
    }

    fn close_form(&mut self) {
        if self.mode == Mode::Editing {
            self.store.cancel_edit();
        }
        self.mode = Mode::Normal;
    }

    fn begin_edit(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        if self.store.begin_edit(&id).is_some() {
            self.mode = Mode::Editing;
            self.field = FormField::Title;
        }
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.store.toggle_completion(&id) {
            Ok(true) => self.notices.info("Task status updated"),
            Ok(false) => {}
            Err(err) => self.report(err),
        }
        self.clamp_selection();
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.store.delete_task(&id) {
            Ok(true) => self.notices.success("Task deleted"),
            Ok(false) => {}
            Err(err) => self.report(err),
        }
        self.clamp_selection();
    }

    fn cycle_filter(&mut self, forward: bool) {
        let choices = Filter::choices(self.store.categories());
        let idx = choices.iter().position(|f| *f == self.filter).unwrap_or(0);
        let len = choices.len();
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        self.filter = choices[next].clone();
        self.selected = 0;
        debug!(filter = %self.filter, "filter changed");
    }

    fn toggle_theme(&mut self) {
        self.dark_mode = !self.dark_mode;
        if let Err(err) = theme::save_dark_mode(self.store.storage_mut(), self.dark_mode) {
            self.report(err);
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.store.filtered_view(&self.filter, &self.search).count();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn report(&mut self, err: TaskError) {
        self.notices.error(format!("Could not save changes: {err}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;
    use crate::storage::{KeyValueStore, MemoryStore, THEME_KEY};

    fn app() -> App {
        App::new(TaskStore::load(Box::new(MemoryStore::new())), true)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn add_via_keys(app: &mut App, title: &str) {
        press(app, KeyCode::Char('a'));
        type_str(app, title);
        press(app, KeyCode::Enter);
    }

    fn notice(app: &App) -> (NoticeLevel, String) {
        let n = app.notices.current().unwrap();
        (n.level, n.message.clone())
    }

    #[test]
    fn test_add_task_through_form() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "Buy milk");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Normal);
        let task = &app.store.tasks()[0];
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.category, "shopping");
        assert_eq!(
            notice(&app),
            (NoticeLevel::Success, "Task added successfully".to_string())
        );
    }

    #[test]
    fn test_empty_title_keeps_form_open() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "  ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Adding);
        assert!(app.store.tasks().is_empty());
        assert_eq!(
            notice(&app),
            (NoticeLevel::Error, "Task title cannot be empty".to_string())
        );
    }

    #[test]
    fn test_toggle_and_delete_selected() {
        let mut app = app();
        add_via_keys(&mut app, "one");
        add_via_keys(&mut app, "two");
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char(' '));
        assert!(app.store.tasks()[1].is_completed);
        assert_eq!(notice(&app).0, NoticeLevel::Info);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.store.tasks().len(), 1);
        assert_eq!(app.store.tasks()[0].title, "two");
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_edit_and_cancel() {
        let mut app = app();
        add_via_keys(&mut app, "draft");
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.mode, Mode::Editing);
        type_str(&mut app, "!!");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.store.tasks()[0].title, "draft");
        assert!(app.store.draft().is_none());

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "ed");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.store.tasks()[0].title, "drafed");
        assert_eq!(notice(&app).1, "Task updated");
    }

    #[test]
    fn test_search_and_filter_narrow_selection() {
        let mut app = app();
        add_via_keys(&mut app, "Buy milk");
        add_via_keys(&mut app, "Walk dog");
        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "MILK");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.visible_tasks().len(), 1);
        assert_eq!(app.selected_id().as_deref(), Some(app.store.tasks()[1].id.as_str()));

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.filter, Filter::Active);
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.filter, Filter::Completed);
        assert!(app.visible_tasks().is_empty());
        press(&mut app, KeyCode::Char('F'));
        press(&mut app, KeyCode::Char('F'));
        assert_eq!(app.filter, Filter::All);

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert!(app.search.is_empty());
        assert_eq!(app.visible_tasks().len(), 2);
    }

    #[test]
    fn test_theme_toggle_persists() {
        let mut app = app();
        press(&mut app, KeyCode::Char('t'));
        assert!(!app.dark_mode);
        assert_eq!(
            app.store.storage().get(THEME_KEY).unwrap().as_deref(),
            Some("false")
        );
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);

        let mut app = self::app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_typing_q_in_form_does_not_quit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "quiz");
        assert!(!app.should_quit);
        assert_eq!(app.form.title, "quiz");
    }

    #[test]
    fn test_actions_on_empty_list_are_noops() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.selected, 0);
        assert!(app.notices.current().is_none());
    }
}

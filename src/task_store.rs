use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{Result, TaskError};
use crate::filter::{Filter, FilteredView};
use crate::storage::{self, KeyValueStore, CATEGORIES_KEY, TASKS_KEY};
use crate::task::{parse_due_date, Category, EditDraft, NewTask, Task};

const EMPTY_TITLE: &str = "Task title cannot be empty";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.is_completed).count();
        Self {
            total: tasks.len(),
            completed,
            pending: tasks.len() - completed,
        }
    }
}

/// Owns the task and category collections and writes both back to storage
/// after every change.
pub struct TaskStore {
    storage: Box<dyn KeyValueStore>,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    editing: Option<EditDraft>,
}

impl TaskStore {
    /// Loads both collections. Absent or unreadable data falls back to an
    /// empty task list and the default categories.
    pub fn load(storage: Box<dyn KeyValueStore>) -> Self {
        let tasks: Vec<Task> = load_or_default(storage.as_ref(), TASKS_KEY, Vec::new);
        let categories = load_or_default(storage.as_ref(), CATEGORIES_KEY, Category::defaults);
        info!(
            tasks = tasks.len(),
            categories = categories.len(),
            "loaded task store"
        );
        Self {
            storage,
            tasks,
            categories,
            editing: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    pub fn storage_mut(&mut self) -> &mut dyn KeyValueStore {
        self.storage.as_mut()
    }

    /// Validates `input`, prepends the new task and clears the form.
    pub fn add_task(&mut self, input: &mut NewTask) -> Result<&Task> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(TaskError::validation(EMPTY_TITLE));
        }
        let due_date = parse_due_date(&input.due_date)?;

        let task = Task {
            id: self.next_id(),
            title: title.to_string(),
            description: input.description.trim().to_string(),
            due_date,
            priority: input.priority,
            category: input.category.clone(),
            is_completed: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        debug!(id = %task.id, "adding task");
        self.tasks.insert(0, task);
        input.clear();
        self.persist()?;
        Ok(&self.tasks[0])
    }

    /// Returns `false` when no task has this id.
    pub fn toggle_completion(&mut self, id: &str) -> Result<bool> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.is_completed = !task.is_completed;
        debug!(id, completed = task.is_completed, "toggled task");
        self.persist()?;
        Ok(true)
    }

    /// Returns `false` when no task has this id.
    pub fn delete_task(&mut self, id: &str) -> Result<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Ok(false);
        }
        if self.editing.as_ref().is_some_and(|d| d.id == id) {
            self.editing = None;
        }
        debug!(id, "deleted task");
        self.persist()?;
        Ok(true)
    }

    /// Stages a copy of the task for editing, replacing any previous draft.
    pub fn begin_edit(&mut self, id: &str) -> Option<&mut EditDraft> {
        let draft = EditDraft::from_task(self.get(id)?);
        self.editing = Some(draft);
        self.editing.as_mut()
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        self.editing.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut EditDraft> {
        self.editing.as_mut()
    }

    /// Writes the staged draft back into its task. On validation failure the
    /// draft stays staged and nothing changes. `Ok(None)` when no draft is
    /// staged or its task has since been deleted.
    pub fn apply_edit(&mut self) -> Result<Option<&Task>> {
        let Some(draft) = self.editing.as_ref() else {
            return Ok(None);
        };
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(TaskError::validation(EMPTY_TITLE));
        }
        let due_date = parse_due_date(&draft.due_date)?;

        let Some(idx) = self.tasks.iter().position(|t| t.id == draft.id) else {
            self.editing = None;
            return Ok(None);
        };
        let task = &mut self.tasks[idx];
        task.title = title.to_string();
        task.description = draft.description.trim().to_string();
        task.due_date = due_date;
        task.priority = draft.priority;
        task.category = draft.category.clone();
        task.updated_at = Some(Utc::now());
        debug!(id = %task.id, "applied edit");

        self.editing = None;
        self.persist()?;
        Ok(Some(&self.tasks[idx]))
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn filtered_view(&self, filter: &Filter, search_query: &str) -> FilteredView<'_> {
        FilteredView::new(&self.tasks, filter, search_query)
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }

    /// The category for `id`, or a placeholder when it no longer exists.
    pub fn category_info(&self, id: &str) -> Category {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .unwrap_or_else(|| Category::unknown(id))
    }

    /// The id is the slug of `name`. Slugs that a filter would read as a
    /// completion state or priority are rejected.
    pub fn add_category(&mut self, name: &str, color: &str) -> Result<&Category> {
        let name = name.trim();
        let id = to_slug(name);
        if id.is_empty() {
            return Err(TaskError::validation("Category name cannot be empty"));
        }
        if Filter::is_reserved(&id) {
            return Err(TaskError::validation(format!("'{name}' is reserved for filters")));
        }
        if self.categories.iter().any(|c| c.id == id) {
            return Err(TaskError::validation(format!("Category '{name}' already exists")));
        }
        self.categories.push(Category::new(id, name, color));
        self.persist()?;
        Ok(&self.categories[self.categories.len() - 1])
    }

    /// Tasks keep their reference to a deleted category.
    pub fn delete_category(&mut self, id: &str) -> Result<bool> {
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        if self.categories.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn next_id(&self) -> String {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = millis.to_string();
            if self.get(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }

    fn persist(&mut self) -> Result<()> {
        let result = storage::save_json(self.storage.as_mut(), TASKS_KEY, &self.tasks)
            .and_then(|_| storage::save_json(self.storage.as_mut(), CATEGORIES_KEY, &self.categories));
        if let Err(err) = &result {
            warn!(error = %err, "failed to persist task store");
        }
        result
    }
}

fn load_or_default<T, F>(storage: &dyn KeyValueStore, key: &str, default: F) -> T
where
    T: serde::de::DeserializeOwned,
    F: FnOnce() -> T,
{
    match storage::load_json(storage, key) {
        Ok(Some(value)) => value,
        Ok(None) => default(),
        Err(err) => {
            warn!(key, error = %err, "discarding unreadable stored data");
            default()
        }
    }
}

/// "Side Projects" -> "side-projects"
pub fn to_slug(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

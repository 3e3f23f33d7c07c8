use std::fmt;
use std::str::FromStr;

use crate::error::TaskError;
use crate::task::{Category, Priority, Task};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
    Priority(Priority),
    Category(String),
}

impl Filter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.is_completed,
            Filter::Completed => task.is_completed,
            Filter::Priority(p) => task.priority == *p,
            Filter::Category(id) => task.category == *id,
        }
    }

    /// Names that parse to something other than a category.
    pub fn is_reserved(id: &str) -> bool {
        matches!(id, "all" | "active" | "completed")
            || Priority::ALL.iter().any(|p| p.as_str() == id)
    }

    /// Order the filter bar cycles through.
    pub fn choices(categories: &[Category]) -> Vec<Filter> {
        let mut out = vec![
            Filter::All,
            Filter::Active,
            Filter::Completed,
            Filter::Priority(Priority::High),
            Filter::Priority(Priority::Medium),
            Filter::Priority(Priority::Low),
        ];
        out.extend(categories.iter().map(|c| Filter::Category(c.id.clone())));
        out
    }

    pub fn label(&self, categories: &[Category]) -> String {
        match self {
            Filter::All => "All".to_string(),
            Filter::Active => "Active".to_string(),
            Filter::Completed => "Completed".to_string(),
            Filter::Priority(p) => p.label().to_string(),
            Filter::Category(id) => categories
                .iter()
                .find(|c| c.id == *id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| id.clone()),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("all"),
            Filter::Active => f.write_str("active"),
            Filter::Completed => f.write_str("completed"),
            Filter::Priority(p) => write!(f, "{p}"),
            Filter::Category(id) => f.write_str(id),
        }
    }
}

/// Reserved words win over category ids; see [`Filter::is_reserved`].
impl FromStr for Filter {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s {
            "" | "all" => Filter::All,
            "active" => Filter::Active,
            "completed" => Filter::Completed,
            other => match other.parse::<Priority>() {
                Ok(p) if other == p.as_str() => Filter::Priority(p),
                _ => Filter::Category(other.to_string()),
            },
        })
    }
}

/// Lazy projection over a task slice. Cloning restarts the sequence from the
/// current position, so a fresh view from the store always starts at the head.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    tasks: std::slice::Iter<'a, Task>,
    filter: Filter,
    needle: String,
}

impl<'a> FilteredView<'a> {
    pub fn new(tasks: &'a [Task], filter: &Filter, search_query: &str) -> Self {
        Self {
            tasks: tasks.iter(),
            filter: filter.clone(),
            needle: search_query.to_lowercase(),
        }
    }
}

impl<'a> Iterator for FilteredView<'a> {
    type Item = &'a Task;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = &self.filter;
        let needle = &self.needle;
        self.tasks
            .by_ref()
            .find(|t| filter.matches(t) && t.matches_search(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn task(id: &str, title: &str, done: bool, priority: Priority, category: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            due_date: None,
            priority,
            category: category.to_string(),
            is_completed: done,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn fixture() -> Vec<Task> {
        vec![
            task("1", "Buy milk", false, Priority::High, "shopping"),
            task("2", "File taxes", true, Priority::Medium, "work"),
            task("3", "Run 5k", true, Priority::Low, "health"),
            task("4", "Milk the cow", false, Priority::Low, ""),
        ]
    }

    fn ids(view: FilteredView<'_>) -> Vec<&str> {
        view.map(|t| t.id.as_str()).collect()
    }

    #[rstest]
    #[case("all", Filter::All)]
    #[case("", Filter::All)]
    #[case("active", Filter::Active)]
    #[case("completed", Filter::Completed)]
    #[case("high", Filter::Priority(Priority::High))]
    #[case("low", Filter::Priority(Priority::Low))]
    #[case("shopping", Filter::Category("shopping".to_string()))]
    #[case("HIGH", Filter::Category("HIGH".to_string()))]
    fn test_parse_filter(#[case] input: &str, #[case] expected: Filter) {
        assert_eq!(input.parse::<Filter>().unwrap(), expected);
    }

    #[rstest]
    #[case(Filter::All, "", vec!["1", "2", "3", "4"])]
    #[case(Filter::Active, "", vec!["1", "4"])]
    #[case(Filter::Completed, "", vec!["2", "3"])]
    #[case(Filter::Priority(Priority::Low), "", vec!["3", "4"])]
    #[case(Filter::Category("work".to_string()), "", vec!["2"])]
    #[case(Filter::All, "MILK", vec!["1", "4"])]
    #[case(Filter::Active, "cow", vec!["4"])]
    #[case(Filter::Completed, "milk", vec![])]
    #[case(Filter::All, " milk", vec!["1"])]
    #[case(Filter::All, "   ", vec![])]
    fn test_filtered_view(#[case] filter: Filter, #[case] query: &str, #[case] expected: Vec<&str>) {
        let tasks = fixture();
        assert_eq!(ids(FilteredView::new(&tasks, &filter, query)), expected);
    }

    #[test]
    fn test_search_matches_description() {
        let mut tasks = fixture();
        tasks[1].description = "Remember the oat milk receipt".to_string();
        let view = FilteredView::new(&tasks, &Filter::All, "milk");
        assert_eq!(ids(view), vec!["1", "2", "4"]);
    }

    #[test]
    fn test_search_query_is_not_trimmed() {
        let tasks = vec![
            task("1", "Buy milk", false, Priority::Medium, ""),
            task("2", "buttermilk", false, Priority::Medium, ""),
        ];
        let view = FilteredView::new(&tasks, &Filter::All, " milk");
        assert_eq!(ids(view), vec!["1"]);
        let view = FilteredView::new(&tasks, &Filter::All, " ");
        assert_eq!(ids(view), vec!["1"]);
    }

    #[test]
    fn test_view_is_restartable() {
        let tasks = fixture();
        let view = FilteredView::new(&tasks, &Filter::Active, "");
        let first: Vec<_> = view.clone().collect();
        let second: Vec<_> = view.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reserved_names() {
        for name in ["all", "active", "completed", "low", "medium", "high"] {
            assert!(Filter::is_reserved(name));
            assert!(!matches!(name.parse::<Filter>().unwrap(), Filter::Category(_)));
        }
        assert!(!Filter::is_reserved("shopping"));
    }

    #[test]
    fn test_choices_include_categories() {
        let choices = Filter::choices(&Category::defaults());
        assert_eq!(choices.len(), 10);
        assert_eq!(choices[6], Filter::Category("work".to_string()));
        assert_eq!(choices[6].label(&Category::defaults()), "Work");
    }
}

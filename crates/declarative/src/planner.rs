//! Plan - an ordered, tag-filterable list of tasks

use crate::tags::TagSet;
use crate::task::{BoxedTask, Task};

/// Tasks in registration order plus the tag filter requested by the caller
///
/// Tasks hold their own handle on the effective configuration. The plan is
/// built once per command and never mutated afterwards; selection is
/// evaluated lazily by [`Plan::selected`].
#[derive(Debug)]
pub struct Plan {
    tasks: Vec<BoxedTask>,
    tags: TagSet,
}

impl Plan {
    /// Create a plan from an already ordered task list
    pub fn new(tasks: Vec<BoxedTask>, tags: TagSet) -> Self {
        Self { tasks, tags }
    }

    /// Start an empty plan, adding tasks with [`PlanBuilder::task`]
    pub fn builder(tags: TagSet) -> PlanBuilder {
        PlanBuilder {
            plan: Self::new(Vec::new(), tags),
        }
    }

    /// The requested tag filter
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Every task, selected or not, in order
    pub fn tasks(&self) -> impl Iterator<Item = &dyn Task> {
        self.tasks.iter().map(|task| &**task as &dyn Task)
    }

    /// Tasks matching the requested tags, in order
    pub fn selected(&self) -> impl Iterator<Item = &dyn Task> {
        self.tasks()
            .filter(move |task| self.tags.selects(task.tags()))
    }

    /// Total number of tasks in the plan
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Builder that appends tasks in registration order
pub struct PlanBuilder {
    plan: Plan,
}

impl PlanBuilder {
    /// Append a task. Names must be unique within one plan.
    pub fn task<T: Task + 'static>(mut self, task: T) -> Self {
        debug_assert!(
            self.plan.tasks().all(|t| t.name() != task.name()),
            "duplicate task name: {}",
            task.name()
        );
        self.plan.tasks.push(Box::new(task));
        self
    }

    pub fn build(self) -> Plan {
        self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTask;

    fn plan(tags: &str) -> Plan {
        Plan::builder(TagSet::parse(tags))
            .task(StubTask::satisfied("first", &["a"]))
            .task(StubTask::satisfied("second", &["a", "b"]))
            .task(StubTask::satisfied("third", &["c"]))
            .build()
    }

    fn selected_names(plan: &Plan) -> Vec<&str> {
        plan.selected().map(Task::name).collect()
    }

    #[test]
    fn test_filter_selects_intersecting_tasks() {
        assert_eq!(selected_names(&plan("b")), vec!["second"]);
        assert_eq!(selected_names(&plan("a")), vec!["first", "second"]);
        assert_eq!(selected_names(&plan("c,b")), vec!["second", "third"]);
    }

    #[test]
    fn test_empty_filter_selects_all_in_order() {
        assert_eq!(selected_names(&plan("")), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unknown_tag_selects_nothing() {
        let plan = plan("z");
        assert_eq!(selected_names(&plan), Vec::<&str>::new());
        assert_eq!(plan.len(), 3);
    }
}

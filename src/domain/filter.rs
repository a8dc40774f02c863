//! Search, filters and summary figures for the deal board and task lists.

use crate::domain::board::StageOrder;
use crate::domain::client::Client;
use crate::domain::deal::{Deal, DealId, DealStage};
use crate::domain::project::{Project, ProjectId};
use crate::domain::task::{Task, TaskPriority, TaskStatus};
use std::collections::HashSet;

/// Deal board search: free text plus an optional single-stage filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealQuery {
    pub search: String,
    pub stage: Option<DealStage>,
}

impl DealQuery {
    /// Whether the deal passes the query.
    ///
    /// Text matches the deal title, its owner, or the client's name or
    /// company, case-insensitively.
    pub fn matches(&self, deal: &Deal, clients: &[Client]) -> bool {
        if self.stage.is_some_and(|stage| stage != deal.stage) {
            return false;
        }

        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        deal.title.to_lowercase().contains(&term)
            || deal.owner.to_lowercase().contains(&term)
            || clients
                .iter()
                .find(|client| client.id == deal.client_id)
                .is_some_and(|client| client.matches(&term))
    }
}

/// The part of the board visible under a query
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredBoard {
    pub deals: Vec<Deal>,
    pub order: StageOrder,
    pub totals: PipelineTotals,
}

pub fn filter_board(deals: &[Deal], clients: &[Client], order: &StageOrder, query: &DealQuery) -> FilteredBoard {
    let visible: Vec<Deal> = deals
        .iter()
        .filter(|deal| query.matches(deal, clients))
        .cloned()
        .collect();
    let ids: HashSet<&DealId> = visible.iter().map(|deal| &deal.id).collect();
    let order = order.retain(|_, id| ids.contains(id));
    let totals = PipelineTotals::from_deals(&visible);

    FilteredBoard {
        deals: visible,
        order,
        totals,
    }
}

/// Pipeline summary figures
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PipelineTotals {
    pub total_value: f64,
    pub total_count: usize,
    pub won_count: usize,
    pub lost_count: usize,
    /// Percentage of deals that are won, 0-100
    pub win_rate: f64,
    pub average_ticket: f64,
}

impl PipelineTotals {
    pub fn from_deals(deals: &[Deal]) -> Self {
        let total_value: f64 = deals.iter().map(|deal| deal.value).sum();
        let total_count = deals.len();
        let won_count = deals.iter().filter(|d| d.stage == DealStage::Won).count();
        let lost_count = deals.iter().filter(|d| d.stage == DealStage::Lost).count();

        let (win_rate, average_ticket) = if total_count == 0 {
            (0.0, 0.0)
        } else {
            (
                won_count as f64 / total_count as f64 * 100.0,
                total_value / total_count as f64,
            )
        };

        Self {
            total_value,
            total_count,
            won_count,
            lost_count,
            win_rate,
            average_ticket,
        }
    }
}

/// Task list filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Substring of the task owner, case-insensitive
    pub owner: Option<String>,
    pub project: Option<ProjectId>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Matches title, project name or any tag
    pub search: String,
}

impl TaskQuery {
    pub fn matches(&self, task: &Task, projects: &[Project]) -> bool {
        if let Some(owner) = &self.owner {
            if !task.owner.to_lowercase().contains(&owner.to_lowercase()) {
                return false;
            }
        }
        if self.project.as_ref().is_some_and(|p| *p != task.project_id) {
            return false;
        }
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }

        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        let project_name = projects
            .iter()
            .find(|project| project.id == task.project_id)
            .map(|project| project.name.to_lowercase())
            .unwrap_or_default();

        task.title.to_lowercase().contains(&term)
            || project_name.contains(&term)
            || task.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
    }
}

pub fn filter_tasks<'a>(tasks: &'a [Task], projects: &[Project], query: &TaskQuery) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| query.matches(task, projects))
        .collect()
}

/// Counters for a task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub high_priority: usize,
}

impl TaskStats {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            match task.status {
                TaskStatus::Done => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                _ => {}
            }
            if task.priority == TaskPriority::High {
                stats.high_priority += 1;
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    #[test]
    fn test_deal_search_matches_client_company() {
        let deals = sample::sample_deals();
        let clients = sample::sample_clients();
        let order = StageOrder::from_deals(&deals);
        let query = DealQuery {
            search: "aurora".to_string(),
            stage: None,
        };

        let filtered = filter_board(&deals, &clients, &order, &query);

        assert!(!filtered.deals.is_empty());
        for deal in &filtered.deals {
            let client = clients.iter().find(|c| c.id == deal.client_id).unwrap();
            assert!(client.company.to_lowercase().contains("aurora"));
        }
        assert_eq!(filtered.order.len(), filtered.deals.len());
        filtered.order.validate(&filtered.deals).unwrap();
    }

    #[test]
    fn test_stage_filter_empties_other_columns() {
        let deals = sample::sample_deals();
        let order = StageOrder::from_deals(&deals);
        let query = DealQuery {
            search: String::new(),
            stage: Some(DealStage::Won),
        };

        let filtered = filter_board(&deals, &[], &order, &query);

        for (stage, ids) in filtered.order.iter() {
            if stage != DealStage::Won {
                assert!(ids.is_empty());
            }
        }
        assert_eq!(filtered.order.column(DealStage::Won), order.column(DealStage::Won));
    }

    #[test]
    fn test_pipeline_totals() {
        let mut deals = sample::sample_deals();
        deals.truncate(4);
        deals[0].stage = DealStage::Won;
        deals[1].stage = DealStage::Lost;
        deals[2].stage = DealStage::Proposal;
        deals[3].stage = DealStage::Proposal;
        for deal in deals.iter_mut() {
            deal.value = 250.0;
        }

        let totals = PipelineTotals::from_deals(&deals);
        assert_eq!(totals.total_value, 1000.0);
        assert_eq!(totals.won_count, 1);
        assert_eq!(totals.lost_count, 1);
        assert_eq!(totals.win_rate, 25.0);
        assert_eq!(totals.average_ticket, 250.0);

        assert_eq!(PipelineTotals::from_deals(&[]), PipelineTotals::default());
    }

    #[test]
    fn test_task_query_filters() {
        let tasks = sample::sample_tasks();
        let projects = sample::sample_projects();

        let query = TaskQuery {
            status: Some(TaskStatus::Done),
            ..TaskQuery::default()
        };
        let done = filter_tasks(&tasks, &projects, &query);
        assert!(done.iter().all(|t| t.status == TaskStatus::Done));
        assert!(!done.is_empty());

        let query = TaskQuery {
            search: "loyalty".to_string(),
            ..TaskQuery::default()
        };
        let by_project = filter_tasks(&tasks, &projects, &query);
        assert!(by_project
            .iter()
            .all(|t| t.project_id == ProjectId::from("project-2")));
        assert!(!by_project.is_empty());
    }

    #[test]
    fn test_task_query_owner_is_case_insensitive() {
        let tasks = sample::sample_tasks();
        let query = TaskQuery {
            owner: Some("MARIANA".to_string()),
            ..TaskQuery::default()
        };

        let mine = filter_tasks(&tasks, &[], &query);
        assert!(!mine.is_empty());
        assert!(mine.iter().all(|t| t.owner.contains("Mariana")));
    }

    #[test]
    fn test_task_stats() {
        let tasks = sample::sample_tasks();
        let stats = TaskStats::from_tasks(&tasks);

        assert_eq!(stats.total, tasks.len());
        assert_eq!(
            stats.completed,
            tasks.iter().filter(|t| t.status == TaskStatus::Done).count()
        );
        assert_eq!(
            stats.high_priority,
            tasks.iter().filter(|t| t.priority == TaskPriority::High).count()
        );
    }
}

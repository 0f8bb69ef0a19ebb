//! Read-only views derived from the store state
//!
//! Every view takes the reference date explicitly, so the same state always
//! renders the same numbers.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::metrics::{calculate_average_pace, calculate_total_distance};
use crate::models::{DistanceUnit, Goal, Run, RunType, TargetType};
use crate::store::AppState;

/// Completion percentage of a goal.
///
/// Distance goals with a target are measured against runs dated within
/// `start_date..=deadline`, capped at 100. Every other goal reports its
/// stored `progress`.
pub fn goal_progress(goal: &Goal, runs: &[Run]) -> f64 {
    match (goal.target_type, goal.target_distance) {
        (TargetType::Distance, Some(target)) if target > 0.0 => {
            let covered = calculate_total_distance(
                runs.iter()
                    .filter(|run| run.date >= goal.start_date && run.date <= goal.deadline),
            );
            (covered / target * 100.0).min(100.0)
        }
        _ => goal.progress,
    }
}

pub fn total_runs(runs: &[Run]) -> usize {
    runs.len()
}

pub fn total_distance(runs: &[Run]) -> f64 {
    calculate_total_distance(runs)
}

/// Distance run in the reference date's calendar year
pub fn yearly_distance(runs: &[Run], reference: DateTime<Utc>) -> f64 {
    calculate_total_distance(runs.iter().filter(|run| run.date.year() == reference.year()))
}

/// Distance run in the reference date's calendar month
pub fn monthly_distance(runs: &[Run], reference: DateTime<Utc>) -> f64 {
    calculate_total_distance(runs.iter().filter(|run| {
        run.date.year() == reference.year() && run.date.month() == reference.month()
    }))
}

/// Newest `limit` runs, newest first
pub fn recent_runs(runs: &[Run], limit: usize) -> Vec<&Run> {
    let mut sorted: Vec<&Run> = runs.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(limit);
    sorted
}

pub fn active_goals(goals: &[Goal]) -> Vec<&Goal> {
    goals.iter().filter(|goal| !goal.is_completed).collect()
}

pub fn completed_goals(goals: &[Goal]) -> Vec<&Goal> {
    goals.iter().filter(|goal| goal.is_completed).collect()
}

/// Run history search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFilter {
    /// Case-insensitive substring of location or notes
    pub search: Option<String>,
    pub run_type: Option<RunType>,
}

impl RunFilter {
    pub fn matches(&self, run: &Run) -> bool {
        let type_ok = self.run_type.map_or(true, |t| run.run_type == t);
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                run.location.to_lowercase().contains(&term)
                    || run.notes.to_lowercase().contains(&term)
            }
            _ => true,
        };
        type_ok && search_ok
    }

    /// Matching runs, newest first
    pub fn apply<'a>(&self, runs: &'a [Run]) -> Vec<&'a Run> {
        let mut matched: Vec<&Run> = runs.iter().filter(|run| self.matches(run)).collect();
        matched.sort_by(|a, b| b.date.cmp(&a.date));
        matched
    }
}

/// One page of a result list; pages are zero-based
pub fn page<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page_size == 0 {
        return &[];
    }
    let start = page.saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Goal with its derived progress
#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress<'a> {
    pub goal: &'a Goal,
    pub progress: f64,
}

/// Active and completed goals with progress attached
pub fn goal_board<'a>(state: &'a AppState) -> (Vec<GoalProgress<'a>>, Vec<GoalProgress<'a>>) {
    let with_progress = |goal: &'a Goal| GoalProgress {
        goal,
        progress: goal_progress(goal, &state.runs),
    };
    (
        active_goals(&state.goals).into_iter().map(with_progress).collect(),
        completed_goals(&state.goals).into_iter().map(with_progress).collect(),
    )
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard<'a> {
    pub total_runs: usize,
    pub total_distance: f64,
    pub this_year_distance: f64,
    pub this_month_distance: f64,
    pub recent_runs: Vec<&'a Run>,
    pub active_goals: Vec<GoalProgress<'a>>,
}

impl<'a> Dashboard<'a> {
    pub fn build(state: &'a AppState, reference: DateTime<Utc>, recent_limit: usize) -> Self {
        let (active_goals, _) = goal_board(state);
        Dashboard {
            total_runs: total_runs(&state.runs),
            total_distance: total_distance(&state.runs),
            this_year_distance: yearly_distance(&state.runs, reference),
            this_month_distance: monthly_distance(&state.runs, reference),
            recent_runs: recent_runs(&state.runs, recent_limit),
            active_goals,
        }
    }
}

/// Statistics shown beside the profile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub total_runs: usize,
    pub total_distance: f64,
    /// 0 when there are no runs
    pub average_distance: f64,
    pub this_year_distance: f64,
    pub average_pace: String,
}

impl ProfileSummary {
    pub fn build(runs: &[Run], unit: DistanceUnit, reference: DateTime<Utc>) -> Self {
        let total_runs = total_runs(runs);
        let total_distance = total_distance(runs);
        let average_distance = if total_runs > 0 {
            total_distance / total_runs as f64
        } else {
            0.0
        };

        ProfileSummary {
            total_runs,
            total_distance,
            average_distance,
            this_year_distance: yearly_distance(runs, reference),
            average_pace: calculate_average_pace(runs, unit),
        }
    }
}

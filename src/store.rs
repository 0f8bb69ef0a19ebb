//! Application state store
//!
//! `reduce` is the only place state changes. It is pure, total and
//! deterministic: every `Action` maps the old state to a new one and none
//! can fail. Updating or deleting an id that is not present, and receiving
//! an action kind this build does not know, are idempotent no-ops.
//!
//! `Store` owns the state together with its persistence and is handed to
//! the presentation layer explicitly; there is no global instance.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::metrics::calculate_total_distance;
use crate::models::{Equipment, Goal, Run, TrainingPlan, UserProfile};
use crate::storage::{Persistence, SlotStore};

/// Everything the application knows
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub runs: Vec<Run>,
    pub goals: Vec<Goal>,
    pub training_plans: Vec<TrainingPlan>,
    pub equipment: Vec<Equipment>,
    /// `None` only before initialization
    pub user_profile: Option<UserProfile>,
}

impl AppState {
    /// State with no records and no profile
    pub fn empty() -> Self {
        AppState {
            runs: Vec::new(),
            goals: Vec::new(),
            training_plans: Vec::new(),
            equipment: Vec::new(),
            user_profile: None,
        }
    }
}

impl Default for AppState {
    /// First-run state: no records, default profile
    fn default() -> Self {
        AppState {
            user_profile: Some(UserProfile::default()),
            ..AppState::empty()
        }
    }
}

/// State transitions, serialized as `{"type": "ADD_RUN", "payload": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddRun(Run),
    UpdateRun(Run),
    DeleteRun(String),
    AddGoal(Goal),
    UpdateGoal(Goal),
    DeleteGoal(String),
    UpdateProfile(UserProfile),
    SetRuns(Vec<Run>),
    SetGoals(Vec<Goal>),
}

impl Action {
    /// Wire names of every action kind
    pub const KINDS: [&'static str; 9] = [
        "ADD_RUN",
        "UPDATE_RUN",
        "DELETE_RUN",
        "ADD_GOAL",
        "UPDATE_GOAL",
        "DELETE_GOAL",
        "UPDATE_PROFILE",
        "SET_RUNS",
        "SET_GOALS",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            Action::AddRun(_) => "ADD_RUN",
            Action::UpdateRun(_) => "UPDATE_RUN",
            Action::DeleteRun(_) => "DELETE_RUN",
            Action::AddGoal(_) => "ADD_GOAL",
            Action::UpdateGoal(_) => "UPDATE_GOAL",
            Action::DeleteGoal(_) => "DELETE_GOAL",
            Action::UpdateProfile(_) => "UPDATE_PROFILE",
            Action::SetRuns(_) => "SET_RUNS",
            Action::SetGoals(_) => "SET_GOALS",
        }
    }

    /// Decode a serialized action.
    ///
    /// Returns `Ok(None)` when the `type` tag is missing or not a known
    /// kind, and an error when a known kind carries a malformed payload.
    pub fn from_json(text: &str) -> Result<Option<Action>> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let known = value
            .get("type")
            .and_then(|t| t.as_str())
            .is_some_and(|kind| Self::KINDS.contains(&kind));
        if !known {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }
}

/// Apply one action to the state
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::AddRun(run) => {
            state.runs.push(run);
            refresh_run_aggregates(&mut state);
        }
        Action::UpdateRun(run) => {
            if replace_by_id(&mut state.runs, run, |r| &r.id) == 0 {
                debug!("Update for unknown run ignored");
            }
            refresh_run_aggregates(&mut state);
        }
        Action::DeleteRun(id) => {
            state.runs.retain(|run| run.id != id);
            refresh_run_aggregates(&mut state);
        }
        Action::AddGoal(goal) => {
            state.goals.push(goal);
        }
        Action::UpdateGoal(goal) => {
            if replace_by_id(&mut state.goals, goal, |g| &g.id) == 0 {
                debug!("Update for unknown goal ignored");
            }
        }
        Action::DeleteGoal(id) => {
            state.goals.retain(|goal| goal.id != id);
        }
        Action::UpdateProfile(profile) => {
            state.user_profile = Some(profile);
        }
        Action::SetRuns(runs) => {
            state.runs = runs;
        }
        Action::SetGoals(goals) => {
            state.goals = goals;
        }
    }
    state
}

/// Replace every record whose id matches `record`'s; returns the count
fn replace_by_id<T, F>(records: &mut [T], record: T, id_of: F) -> usize
where
    T: Clone,
    F: Fn(&T) -> &String,
{
    let id = id_of(&record).clone();
    let mut replaced = 0;
    for slot in records.iter_mut().filter(|r| *id_of(r) == id) {
        *slot = record.clone();
        replaced += 1;
    }
    replaced
}

/// Recompute lifetime and year-to-date totals from the current runs.
///
/// Year-to-date distance and count cover the whole run set and `hours` is
/// left as stored. Skipped when there is no profile.
fn refresh_run_aggregates(state: &mut AppState) {
    let Some(profile) = state.user_profile.as_mut() else {
        debug!("No profile loaded, skipping aggregate refresh");
        return;
    };

    let total = calculate_total_distance(&state.runs);
    profile.total_lifetime_miles = total;
    profile.year_to_date_stats.distance = total;
    profile.year_to_date_stats.runs = state.runs.len() as u32;
}

/// Owned state container wired to persistence
pub struct Store<S: SlotStore> {
    state: AppState,
    persistence: Persistence<S>,
}

impl<S: SlotStore> Store<S> {
    /// Start from the first-run state and rehydrate whatever slots load
    pub fn open(persistence: Persistence<S>) -> Self {
        let mut store = Store {
            state: AppState::default(),
            persistence,
        };
        store.rehydrate();
        store
    }

    fn rehydrate(&mut self) {
        let loaded = self.persistence.load();
        let mut state = std::mem::take(&mut self.state);

        if let Some(runs) = loaded.runs {
            info!(count = runs.len(), "Loaded runs");
            state = reduce(state, Action::SetRuns(runs));
        }
        if let Some(goals) = loaded.goals {
            info!(count = goals.len(), "Loaded goals");
            state = reduce(state, Action::SetGoals(goals));
        }
        if let Some(profile) = loaded.profile {
            info!(profile = %profile.id, "Loaded profile");
            state = reduce(state, Action::UpdateProfile(profile));
        }

        self.state = state;
        self.persistence.save(&self.state);
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Apply an action, then mirror the new state to storage
    pub fn dispatch(&mut self, action: Action) -> &AppState {
        let kind = action.kind();
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);

        let slots = self.persistence.save(&self.state);
        debug!(action = kind, slots, runs = self.state.runs.len(), "Action applied");
        &self.state
    }

    /// Apply a serialized action; unknown kinds leave the state unchanged
    pub fn dispatch_json(&mut self, text: &str) -> &AppState {
        match Action::from_json(text) {
            Ok(Some(action)) => self.dispatch(action),
            Ok(None) => {
                warn!("Ignoring action of unknown kind");
                &self.state
            }
            Err(e) => {
                warn!(error = %e, "Ignoring malformed action");
                &self.state
            }
        }
    }

    /// Flush state one last time and hand it back
    pub fn close(mut self) -> AppState {
        self.persistence.save(&self.state);
        debug!("Store closed");
        self.state
    }
}

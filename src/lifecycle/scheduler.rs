//! Periodic scheduler draining pending lifecycle work.
//!
//! One long-lived task ticks at a fixed interval and scans the project set
//! in sorted id order. Any `*-pending` project is atomically claimed to its
//! `*-running` state, its action runs to completion inside the pass, and the
//! project returns to idle with the captured output. Actions across projects
//! are serialized within a pass; the HTTP surface stays responsive because
//! the set is only touched through its atomic operations and no lock spans
//! an external command.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::{Action, ProjectSet, actions};

pub struct Scheduler {
    projects: Arc<ProjectSet>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(projects: Arc<ProjectSet>, interval: Duration) -> Self {
        Self { projects, interval }
    }

    /// Run the scheduler loop until the shutdown channel signals.
    ///
    /// An in-flight pass finishes before the loop exits; started actions are
    /// never cancelled.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval = ?self.interval, "scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.pass().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("scheduler stopped");
    }

    /// One scan over all projects, advancing every pending entry.
    ///
    /// Public so tests can drive passes deterministically without the timer.
    pub async fn pass(&self) {
        for id in self.projects.ids().await {
            let Some((project, action)) = self.projects.claim_pending(&id).await else {
                continue;
            };
            tracing::info!(project = %id, %action, "action started");
            let output = run_action(&project, action).await;
            self.projects.complete(&id, output).await;
            tracing::info!(project = %id, %action, "action finished");
        }
    }
}

async fn run_action(project: &crate::registry::Project, action: Action) -> Vec<String> {
    match action {
        Action::Build => actions::build(project).await,
        Action::Up => actions::compose_up(project).await,
        Action::Down => actions::compose_down(project).await,
    }
}

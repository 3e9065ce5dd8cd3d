// file: src/pipeline/mod.rs
// version: 1.0.0
// guid: b70575e6-2cba-4018-8934-e35ba8ff91d1

//! Ordered, fail-fast stage runner

use crate::config::DeployConfig;
use crate::context::DeploymentContext;
use crate::reporter::ProgressReporter;
use crate::runner::CommandRunner;
use crate::steps::{
    self, failure_result, skipped_result, success_result, DeployState, Precondition, Stage,
    StageContext, StageResult, StageStatus,
};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, error, info, Instrument};
use uuid::Uuid;

/// Process exit code for a completed deployment
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code for an aborted deployment
pub const EXIT_FAILURE: i32 = 1;

/// Where the pipeline is in its linear chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started
    Pending,

    /// Executing the given 1-based stage
    Running { stage: usize, name: String },

    /// Every stage completed or skipped
    Complete,

    /// A stage failed; nothing after it ran
    Aborted { stage: usize, name: String },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Aborted { .. })
    }

    /// Only forward moves are legal
    fn can_transition_to(&self, next: &PipelineState) -> bool {
        match (self, next) {
            (Self::Pending, Self::Running { stage, .. }) => *stage == 1,
            (Self::Pending, Self::Complete) => true,
            (Self::Running { stage: current, .. }, Self::Running { stage, .. }) => {
                *stage == current + 1
            }
            (Self::Running { .. }, Self::Complete) => true,
            (Self::Running { stage: current, .. }, Self::Aborted { stage, .. }) => {
                stage == current
            }
            _ => false,
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Terminal state
    pub state: PipelineState,
    /// One entry per stage that was reached
    pub results: Vec<StageResult>,
    /// State handed from stage to stage, as left by the last one
    pub deploy: DeployState,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Complete
    }

    pub fn exit_code(&self) -> i32 {
        if self.succeeded() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    /// The failed stage, if the run aborted
    pub fn failure(&self) -> Option<&StageResult> {
        self.results
            .iter()
            .find(|r| r.status == StageStatus::Failed)
    }

    /// Result of the named stage, if it was reached
    pub fn stage(&self, name: &str) -> Option<&StageResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }
}

/// The deployment pipeline
pub struct Pipeline {
    session_id: Uuid,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Pipeline with the standard eight stages
    pub fn new() -> Self {
        Self::with_stages(steps::default_stages())
    }

    pub fn with_stages(stages: Vec<Box<dyn Stage>>) -> Self {
        let session_id = Uuid::new_v4();
        info!("Creating new deployment session: {}", session_id);
        Self { session_id, stages }
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order, stopping at the first failure
    pub async fn run(
        &self,
        deployment: &DeploymentContext,
        config: &DeployConfig,
        runner: &dyn CommandRunner,
        reporter: &dyn ProgressReporter,
    ) -> PipelineReport {
        let ctx = StageContext {
            session_id: self.session_id,
            deployment,
            config,
            runner,
        };

        let started_at = Utc::now();
        let total = self.stages.len();
        let mut current = PipelineState::Pending;
        let mut deploy = DeployState::default();
        let mut results = Vec::with_capacity(total);

        for (index, stage) in self.stages.iter().enumerate() {
            let number = index + 1;
            transition(
                &mut current,
                PipelineState::Running {
                    stage: number,
                    name: stage.name().to_string(),
                },
            );

            reporter.stage_started(number, total, stage.as_ref());
            let span = tracing::info_span!(
                "stage",
                session = %ctx.session_id,
                number,
                name = stage.name()
            );
            let result = run_stage(stage.as_ref(), number, &ctx, &mut deploy)
                .instrument(span)
                .await;
            reporter.stage_finished(&result);

            let failed = result.status == StageStatus::Failed;
            results.push(result);

            if failed {
                transition(
                    &mut current,
                    PipelineState::Aborted {
                        stage: number,
                        name: stage.name().to_string(),
                    },
                );
                break;
            }
        }

        if !current.is_terminal() {
            transition(&mut current, PipelineState::Complete);
        }

        PipelineReport {
            session_id: self.session_id,
            started_at,
            completed_at: Utc::now(),
            state: current,
            results,
            deploy,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn transition(current: &mut PipelineState, next: PipelineState) {
    debug_assert!(
        current.can_transition_to(&next),
        "illegal pipeline transition {:?} -> {:?}",
        current,
        next
    );
    debug!("Pipeline state: {:?} -> {:?}", current, next);
    *current = next;
}

async fn run_stage(
    stage: &dyn Stage,
    number: usize,
    ctx: &StageContext<'_>,
    deploy: &mut DeployState,
) -> StageResult {
    let started = Instant::now();

    let outcome = match stage.check(ctx, deploy).await {
        Ok(Precondition::Skip(reason)) => {
            info!("Skipping: {}", reason);
            return skipped_result(number, stage.name(), reason);
        }
        Ok(Precondition::Proceed) => stage.execute(ctx, deploy).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(message) => {
            info!("{}", message);
            success_result(number, stage.name(), message, started.elapsed())
        }
        Err(e) => {
            error!("Stage {} ({}) failed: {}", number, stage.name(), e);
            let hint = stage.remediation(ctx, &e);
            failure_result(number, stage.name(), &e, hint, started.elapsed())
        }
    }
}

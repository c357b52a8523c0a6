//! Worker thread which walks the robot along planned paths, so goals and maps can be accepted
//! without blocking the main thread.

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use std::sync::{
    atomic::Ordering,
    mpsc::{Receiver, Sender, TryRecvError},
    Arc,
};

use comms_if::nav::{NavGoal, OccupancyGrid};
use log::{debug, error, info, warn};
use util::session;

use super::{
    walk::{StepRecord, WalkRecord},
    ExecReport, ExecState, Shared, StepExecError, WalkOutcome,
};
use crate::{
    footstep::{PlannedPath, RelativeFootstep},
    planner::Planner,
    pose::PoseSource,
    step_service::{check_step, FeasibilityCheck, StepActuator, StepVerdict},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The worker owns the collaborators, nothing else talks to them while it runs.
pub(super) struct Worker {
    pub(super) shared: Arc<Shared>,

    pub(super) planner: Box<dyn Planner>,
    pub(super) pose_source: Arc<dyn PoseSource>,
    pub(super) feasibility: Box<dyn FeasibilityCheck>,
    pub(super) actuator: Box<dyn StepActuator>,

    pub(super) signals: Receiver<WorkerSignal>,
    pub(super) reports: Sender<ExecReport>,

    pub(super) stop_requested: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub enum WorkerSignal {
    /// The worker should stop, abandoning any walk at the next step
    Stop,

    /// Walk to a new goal
    Goal(NavGoal),

    /// A new map for the planner
    Map(OccupancyGrid),
}

/// How following a single path ended.
enum PathResult {
    Completed,
    StepRejected,
    Stopped,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

pub(super) fn worker_thread(mut worker: Worker) -> Result<(), StepExecError> {
    // Wait for commands from main
    while let Ok(signal) = worker.signals.recv() {
        match signal {
            WorkerSignal::Stop => break,
            WorkerSignal::Map(map) => worker.apply_map(map),
            WorkerSignal::Goal(goal) => worker.walk_to(goal)?,
        }

        if worker.stop_requested {
            break;
        }
    }

    debug!("StepExec worker exiting");

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Worker {
    /// Walk to the goal, returning to idle whatever the outcome.
    fn walk_to(&mut self, goal: NavGoal) -> Result<(), StepExecError> {
        let mut record = WalkRecord::new(goal);

        let outcome = match self.execute_goal(goal, &mut record) {
            Ok(o) => o,
            Err(e) => {
                // The worker exits, new goals must see it has stopped rather than a busy walk
                self.shared.executing.store(false, Ordering::Release);
                return Err(e);
            }
        };

        record.finish(outcome);
        info!(
            "Walk finished: {} ({} steps, {} replans)",
            outcome,
            record.steps.len(),
            record.num_replans()
        );
        session::save_with_timestamp("walks/walk.json", record);

        self.shared.executing.store(false, Ordering::Release);
        self.set_state(ExecState::Idle)?;
        self.report(ExecReport::WalkFinished(outcome));

        Ok(())
    }

    fn execute_goal(
        &mut self,
        goal: NavGoal,
        record: &mut WalkRecord,
    ) -> Result<WalkOutcome, StepExecError> {
        self.set_state(ExecState::Planning)?;
        info!(
            "Planning to goal ({:.3}, {:.3}, {:.3})",
            goal.x_m, goal.y_m, goal.theta_rad
        );

        if let Err(e) = self.planner.set_goal(&goal) {
            error!("Goal not accepted by the planner: {}", e);
            return Ok(WalkOutcome::PlanningFailed);
        }

        if let Err(e) = self.update_start() {
            error!("Start pose not accessible, check your odometry: {}", e);
            return Ok(WalkOutcome::StartPoseUnavailable);
        }

        if let Err(e) = self.planner.plan() {
            error!("Planning failed: {}", e);
            return Ok(WalkOutcome::PlanningFailed);
        }

        let mut path = self.planner.path().clone();
        if path.is_empty() {
            error!("No plan available");
            return Ok(WalkOutcome::PlanningFailed);
        }

        loop {
            info!("Executing path of {} steps", path.num_steps());
            record.paths.push(path.clone());
            self.set_state(ExecState::Executing)?;

            match self.follow_path(&path, record)? {
                PathResult::Completed => return Ok(WalkOutcome::PathCompleted),
                PathResult::Stopped => return Ok(WalkOutcome::Stopped),
                PathResult::StepRejected => (),
            }

            self.set_state(ExecState::Replanning)?;

            if let Err(e) = self.update_start() {
                error!("Start pose not accessible, check your odometry: {}", e);
                self.set_state(ExecState::Failed)?;
                return Ok(WalkOutcome::StartPoseUnavailable);
            }

            if let Err(e) = self.planner.replan() {
                error!("Replanning failed: {}", e);
                self.set_state(ExecState::Failed)?;
                return Ok(WalkOutcome::ReplanningFailed);
            }

            path = self.planner.path().clone();
            if path.is_empty() {
                error!("No plan available after replanning");
                self.set_state(ExecState::Failed)?;
                return Ok(WalkOutcome::ReplanningFailed);
            }
        }
    }

    /// Walk along the path until it ends or a step cannot be performed, either because it was
    /// rejected by the clipping service or because the robot did not perform it.
    fn follow_path(
        &mut self,
        path: &PlannedPath,
        record: &mut WalkRecord,
    ) -> Result<PathResult, StepExecError> {
        for (planned_support, target) in path.steps() {
            self.handle_pending_signals();
            if self.stop_requested {
                info!("Stop requested, abandoning walk");
                return Ok(PathResult::Stopped);
            }

            let support_leg = target.leg.opposite();
            let support = match self
                .shared
                .poses
                .support_foot(&*self.pose_source, support_leg)?
            {
                Some(s) => s,
                None => {
                    warn!("The {} foot has never been located", support_leg);
                    return Ok(PathResult::StepRejected);
                }
            };

            debug!(
                "Support foot planned at {}, actually at {}",
                planned_support, support
            );

            let request = RelativeFootstep::between(&support, target);

            match check_step(
                self.feasibility.as_mut(),
                &request,
                &self.shared.params.accuracy,
            ) {
                StepVerdict::Performable(step) => {
                    let result = self.actuator.perform(&step);

                    record.steps.push(StepRecord {
                        planned_support: *planned_support,
                        actual_support: support,
                        target: *target,
                        requested: request,
                        clipped: Some(step),
                        performed: result.is_ok(),
                    });

                    match result {
                        Ok(()) => {
                            debug!("Performed {}, landing at {}", step, step.apply_to(&support));
                            self.report(ExecReport::StepPerformed(step));
                        }
                        Err(e) => {
                            warn!("Robot did not perform {}: {}", step, e);
                            info!("Footstep cannot be performed, new path planning necessary");
                            self.report(ExecReport::StepFailed(step));

                            return Ok(PathResult::StepRejected);
                        }
                    }
                }
                StepVerdict::Rejected { requested, clipped } => {
                    info!("Footstep cannot be performed, new path planning necessary");

                    record.steps.push(StepRecord {
                        planned_support: *planned_support,
                        actual_support: support,
                        target: *target,
                        requested,
                        clipped,
                        performed: false,
                    });
                    self.report(ExecReport::StepRejected { requested, clipped });

                    return Ok(PathResult::StepRejected);
                }
            }
        }

        Ok(PathResult::Completed)
    }

    /// Look up both feet and hand them to the planner as the new start.
    fn update_start(&mut self) -> Result<(), StepExecError> {
        let (right, left) = self.shared.poses.update_start(&*self.pose_source)?;
        self.planner.set_start(&right, &left)?;

        debug!("Start set to {} and {}", right, left);

        Ok(())
    }

    /// Process signals which arrived while walking.
    fn handle_pending_signals(&mut self) {
        loop {
            match self.signals.try_recv() {
                Ok(WorkerSignal::Stop) => self.stop_requested = true,
                Ok(WorkerSignal::Map(map)) => self.apply_map(map),
                Ok(WorkerSignal::Goal(goal)) => {
                    info!("Currently walking down a footstep path, no planning possible");
                    self.report(ExecReport::GoalRejected(goal));
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.stop_requested = true;
                    break;
                }
            }
        }
    }

    fn apply_map(&mut self, map: OccupancyGrid) {
        if let Err(e) = self.shared.poses.set_world_frame_id(&map.frame_id) {
            warn!("Could not update the world frame: {}", e);
        }

        match self.planner.set_map(map) {
            Ok(()) => info!("New map passed to the planner"),
            Err(e) => warn!("Planner did not accept the new map: {}", e),
        }
    }

    fn set_state(&self, state: ExecState) -> Result<(), StepExecError> {
        *self.shared.state.write()? = state;

        info!("StepExec state change to: {}", state);
        self.report(ExecReport::StateChange(state));

        Ok(())
    }

    fn report(&self, report: ExecReport) {
        // The receiver only goes away while the manager is shutting down
        self.reports.send(report).ok();
    }
}

//! # Footstep Execution Manager
//!
//! Takes goals, plans a footstep path to them and walks the robot along it. Before every step the
//! relative step is recomputed from where the support foot actually is and checked with the
//! clipping service. If the robot cannot perform the step the path is abandoned and a new one is
//! planned from the current feet.
//!
//! All walking happens on a single worker thread:
//!
//! ```text
//! IDLE -> PLANNING -> EXECUTING -> IDLE
//!             |           | ^
//!             v           v |
//!           IDLE       REPLANNING -> FAILED -> IDLE
//! ```
//!
//! Only one walk is in progress at a time, goals submitted during a walk are rejected.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, RecvTimeoutError, SendError, Sender, TryRecvError},
        Arc, PoisonError, RwLock,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::{DateTime, Utc};
use comms_if::nav::{NavGoal, OccupancyGrid};
use log::{info, warn};
use serde::Serialize;

use crate::{
    footstep::RelativeFootstep,
    params::StepExecParams,
    planner::{Planner, PlannerError},
    pose::{PoseError, PoseSource, PoseTracker, RobotPoseSnapshot},
    step_service::{FeasibilityCheck, StepActuator},
};

use self::worker::{worker_thread, Worker, WorkerSignal};

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod walk;
mod worker;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The footstep execution manager.
pub struct StepExecMgr {
    shared: Arc<Shared>,

    worker_jh: Option<JoinHandle<Result<(), StepExecError>>>,

    worker_sender: Sender<WorkerSignal>,
    report_receiver: Receiver<ExecReport>,
}

/// Data shared between the manager and its worker.
struct Shared {
    params: StepExecParams,

    poses: PoseTracker,

    state: RwLock<ExecState>,

    /// Set from the moment a goal is accepted until the worker is back in idle
    executing: AtomicBool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecState {
    /// Waiting for a goal
    Idle,

    /// Planning a path to a new goal
    Planning,

    /// Walking along a path
    Executing,

    /// Planning a new path after a step could not be performed
    Replanning,

    /// Replanning failed, about to return to idle
    Failed,
}

/// Answer to a submitted goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalResponse {
    Accepted,

    /// A walk is already in progress
    Busy,
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WalkOutcome {
    /// Every step of the last path was performed
    PathCompleted,

    /// The feet could not be located to plan from
    StartPoseUnavailable,

    /// No path to the goal was found
    PlanningFailed,

    /// No new path was found after a step was rejected
    ReplanningFailed,

    /// The manager was stopped during the walk
    Stopped,
}

/// Events reported by the worker as it walks.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecReport {
    StateChange(ExecState),

    /// A goal arrived while walking and was ignored
    GoalRejected(NavGoal),

    /// The robot accepted the step
    StepPerformed(RelativeFootstep),

    /// The step was performable but the robot did not perform it, a replan follows
    StepFailed(RelativeFootstep),

    /// The step could not be performed, a replan follows
    StepRejected {
        requested: RelativeFootstep,
        clipped: Option<RelativeFootstep>,
    },

    WalkFinished(WalkOutcome),
}

#[derive(Debug, thiserror::Error)]
pub enum StepExecError {
    #[error("Sync primitive is poisoned")]
    PoisonError,

    #[error("Could not start the worker thread: {0}")]
    SpawnError(std::io::Error),

    #[error("The worker has stopped")]
    WorkerStopped,

    #[error("The worker thread panicked")]
    WorkerPanicked,

    #[error("Pose error: {0}")]
    PoseError(PoseError),

    #[error("Planner error: {0}")]
    PlannerError(PlannerError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StepExecMgr {
    /// Create a new manager and start its worker.
    pub fn new(
        params: StepExecParams,
        planner: Box<dyn Planner>,
        pose_source: Arc<dyn PoseSource>,
        feasibility: Box<dyn FeasibilityCheck>,
        actuator: Box<dyn StepActuator>,
    ) -> Result<Self, StepExecError> {
        let shared = Arc::new(Shared {
            poses: PoseTracker::new(&params),
            params,
            state: RwLock::new(ExecState::Idle),
            executing: AtomicBool::new(false),
        });

        // Create channels
        let (worker_sender, signals) = channel();
        let (reports, report_receiver) = channel();

        let worker = Worker {
            shared: shared.clone(),
            planner,
            pose_source,
            feasibility,
            actuator,
            signals,
            reports,
            stop_requested: false,
        };

        // Start worker thread
        let worker_jh = thread::Builder::new()
            .name("step_exec::worker".into())
            .spawn(move || worker_thread(worker))
            .map_err(StepExecError::SpawnError)?;

        Ok(Self {
            shared,
            worker_jh: Some(worker_jh),
            worker_sender,
            report_receiver,
        })
    }

    /// Submit a new goal.
    ///
    /// The goal is rejected with [`GoalResponse::Busy`] if a walk is already in progress.
    pub fn submit_goal(&self, goal: NavGoal) -> Result<GoalResponse, StepExecError> {
        if self
            .shared
            .executing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Currently walking down a footstep path, no planning possible");
            return Ok(GoalResponse::Busy);
        }

        if let Err(e) = self.worker_sender.send(WorkerSignal::Goal(goal)) {
            self.shared.executing.store(false, Ordering::Release);
            return Err(e.into());
        }

        Ok(GoalResponse::Accepted)
    }

    /// Pass a new map to the planner. Lookups move to the map's frame.
    ///
    /// During a walk the map is applied before the next step.
    pub fn update_map(&self, map: OccupancyGrid) -> Result<(), StepExecError> {
        self.worker_sender.send(WorkerSignal::Map(map))?;
        Ok(())
    }

    /// Record a new robot pose estimate time, start poses are looked up at the latest one.
    pub fn update_robot_time(&self, time: DateTime<Utc>) -> Result<(), StepExecError> {
        self.shared.poses.set_robot_time(time)?;
        Ok(())
    }

    /// Returns true from the moment a goal is accepted until the walk has finished.
    pub fn is_executing(&self) -> bool {
        self.shared.executing.load(Ordering::Acquire)
    }

    pub fn state(&self) -> Result<ExecState, StepExecError> {
        Ok(*self.shared.state.read()?)
    }

    /// Get a copy of the last known foot poses.
    pub fn pose_snapshot(&self) -> Result<RobotPoseSnapshot, StepExecError> {
        Ok(self.shared.poses.read()?)
    }

    /// Wait up to `timeout` for the next report from the worker.
    pub fn recv_report(&self, timeout: Duration) -> Result<Option<ExecReport>, StepExecError> {
        match self.report_receiver.recv_timeout(timeout) {
            Ok(r) => Ok(Some(r)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(StepExecError::WorkerStopped),
        }
    }

    /// Get the next report from the worker if there is one.
    pub fn try_recv_report(&self) -> Result<Option<ExecReport>, StepExecError> {
        match self.report_receiver.try_recv() {
            Ok(r) => Ok(Some(r)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(StepExecError::WorkerStopped),
        }
    }

    /// Ask the worker to stop without waiting for it. A walk in progress is abandoned before its
    /// next step.
    pub fn request_stop(&self) {
        // Failure means the worker has already gone
        self.worker_sender.send(WorkerSignal::Stop).ok();
    }

    /// Stop the worker and wait for it to exit.
    pub fn stop(&mut self) -> Result<(), StepExecError> {
        self.request_stop();

        match self.worker_jh.take() {
            Some(jh) => jh.join().map_err(|_| StepExecError::WorkerPanicked)?,
            None => Ok(()),
        }
    }
}

impl Drop for StepExecMgr {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("StepExec worker did not exit cleanly: {}", e);
        }
    }
}

impl Display for ExecState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecState::Idle => write!(f, "ExecState::Idle"),
            ExecState::Planning => write!(f, "ExecState::Planning"),
            ExecState::Executing => write!(f, "ExecState::Executing"),
            ExecState::Replanning => write!(f, "ExecState::Replanning"),
            ExecState::Failed => write!(f, "ExecState::Failed"),
        }
    }
}

impl Display for WalkOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalkOutcome::PathCompleted => write!(f, "path completed"),
            WalkOutcome::StartPoseUnavailable => write!(f, "start pose not accessible"),
            WalkOutcome::PlanningFailed => write!(f, "planning failed"),
            WalkOutcome::ReplanningFailed => write!(f, "replanning failed"),
            WalkOutcome::Stopped => write!(f, "stopped"),
        }
    }
}

impl<G> From<PoisonError<G>> for StepExecError {
    fn from(_: PoisonError<G>) -> Self {
        Self::PoisonError
    }
}

impl From<SendError<WorkerSignal>> for StepExecError {
    fn from(_: SendError<WorkerSignal>) -> Self {
        Self::WorkerStopped
    }
}

impl From<PoseError> for StepExecError {
    fn from(e: PoseError) -> Self {
        Self::PoseError(e)
    }
}

impl From<PlannerError> for StepExecError {
    fn from(e: PlannerError) -> Self {
        Self::PlannerError(e)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        footstep::{FootstepState, Leg, PlannedPath},
        pose::{FootTransform, LookupTime},
        step_service::StepServiceError,
    };
    use chrono::TimeZone;
    use std::{
        collections::{HashMap, VecDeque},
        sync::{atomic::AtomicUsize, Mutex},
        time::Instant,
    };

    const WAIT: Duration = Duration::from_secs(5);
    const EPS: f64 = 1e-9;

    /// Everything the mocks were asked to do.
    #[derive(Default)]
    struct Calls {
        set_goal: AtomicUsize,
        set_start: AtomicUsize,
        plan: AtomicUsize,
        replan: AtomicUsize,
        clips: Mutex<Vec<RelativeFootstep>>,
        steps: Mutex<Vec<RelativeFootstep>>,
        /// World frame and time of every pose lookup
        lookups: Mutex<Vec<(String, LookupTime)>>,
        /// Frame of every map given to the planner
        maps: Mutex<Vec<String>>,
    }

    /// A robot whose feet move when steps are performed.
    struct SimRobot {
        feet: Mutex<HashMap<Leg, FootstepState>>,
        lookups_fail: AtomicBool,
    }

    struct MockPoseSource {
        calls: Arc<Calls>,
        robot: Arc<SimRobot>,
    }

    struct MockPlanner {
        calls: Arc<Calls>,
        paths: VecDeque<PlannedPath>,
        path: PlannedPath,
    }

    /// Offsets each request by the next queued offset, or returns it unchanged.
    struct MockClipper {
        calls: Arc<Calls>,
        offsets: VecDeque<(f64, f64, f64)>,
        robot_lost_on_offset: Option<Arc<SimRobot>>,
    }

    /// Moves the robot's feet, or times out on every step if `times_out` is set.
    struct MockActuator {
        calls: Arc<Calls>,
        robot: Arc<SimRobot>,
        gate: Option<Receiver<()>>,
        times_out: bool,
    }

    struct Setup {
        paths: Vec<PlannedPath>,
        offsets: Vec<(f64, f64, f64)>,
        robot_lost_on_offset: bool,
        gate: Option<Receiver<()>>,
        actuation_times_out: bool,
        right: FootstepState,
        left: FootstepState,
    }

    struct Harness {
        mgr: StepExecMgr,
        calls: Arc<Calls>,
        robot: Arc<SimRobot>,
    }

    impl SimRobot {
        fn foot(&self, leg: Leg) -> FootstepState {
            self.feet.lock().unwrap()[&leg]
        }
    }

    impl PoseSource for MockPoseSource {
        fn lookup(
            &self,
            foot_frame_id: &str,
            world_frame_id: &str,
            at: LookupTime,
            _timeout: Duration,
        ) -> Result<FootTransform, PoseError> {
            self.calls
                .lookups
                .lock()
                .unwrap()
                .push((world_frame_id.to_string(), at));

            let leg = match foot_frame_id {
                "/RFoot_link" => Leg::Right,
                "/LFoot_link" => Leg::Left,
                other => panic!("Unknown foot frame {}", other),
            };

            if self.robot.lookups_fail.load(Ordering::SeqCst) {
                return Err(PoseError::Timeout {
                    foot: foot_frame_id.into(),
                    world: world_frame_id.into(),
                });
            }

            let s = self.robot.foot(leg);
            Ok(FootTransform::from_planar(s.x_m, s.y_m, s.theta_rad))
        }
    }

    impl MockPlanner {
        fn next_path(&mut self) -> Result<(), PlannerError> {
            match self.paths.pop_front() {
                Some(p) => {
                    self.path = p;
                    Ok(())
                }
                None => Err(PlannerError::NoPathFound),
            }
        }
    }

    impl Planner for MockPlanner {
        fn set_goal(&mut self, _goal: &NavGoal) -> Result<(), PlannerError> {
            self.calls.set_goal.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn set_start(
            &mut self,
            _right: &FootstepState,
            _left: &FootstepState,
        ) -> Result<(), PlannerError> {
            self.calls.set_start.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn plan(&mut self) -> Result<(), PlannerError> {
            self.calls.plan.fetch_add(1, Ordering::SeqCst);
            self.next_path()
        }

        fn replan(&mut self) -> Result<(), PlannerError> {
            self.calls.replan.fetch_add(1, Ordering::SeqCst);
            self.next_path()
        }

        fn path(&self) -> &PlannedPath {
            &self.path
        }

        fn set_map(&mut self, map: OccupancyGrid) -> Result<(), PlannerError> {
            self.calls.maps.lock().unwrap().push(map.frame_id);
            Ok(())
        }
    }

    impl FeasibilityCheck for MockClipper {
        fn clip(
            &mut self,
            request: &RelativeFootstep,
        ) -> Result<RelativeFootstep, StepServiceError> {
            self.calls.clips.lock().unwrap().push(*request);

            let (dx, dy, dt) = self.offsets.pop_front().unwrap_or((0.0, 0.0, 0.0));
            if dx != 0.0 || dy != 0.0 || dt != 0.0 {
                if let Some(ref robot) = self.robot_lost_on_offset {
                    robot.lookups_fail.store(true, Ordering::SeqCst);
                }
            }

            Ok(RelativeFootstep {
                dx_m: request.dx_m + dx,
                dy_m: request.dy_m + dy,
                dtheta_rad: request.dtheta_rad + dt,
                leg: request.leg,
            })
        }
    }

    impl StepActuator for MockActuator {
        fn perform(&mut self, step: &RelativeFootstep) -> Result<(), StepServiceError> {
            if let Some(ref gate) = self.gate {
                gate.recv_timeout(WAIT).ok();
            }

            if self.times_out {
                return Err(StepServiceError::Timeout);
            }

            self.calls.steps.lock().unwrap().push(*step);

            let mut feet = self.robot.feet.lock().unwrap();
            let support = feet[&step.leg.opposite()];
            feet.insert(step.leg, step.apply_to(&support));

            Ok(())
        }
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                paths: Vec::new(),
                offsets: Vec::new(),
                robot_lost_on_offset: false,
                gate: None,
                actuation_times_out: false,
                right: FootstepState::new(0.0, -0.1, 0.0, Leg::Right),
                left: FootstepState::new(0.0, 0.1, 0.0, Leg::Left),
            }
        }
    }

    impl Setup {
        fn start(self) -> Harness {
            let calls = Arc::new(Calls::default());

            let mut feet = HashMap::new();
            feet.insert(Leg::Right, self.right);
            feet.insert(Leg::Left, self.left);
            let robot = Arc::new(SimRobot {
                feet: Mutex::new(feet),
                lookups_fail: AtomicBool::new(false),
            });

            let planner = MockPlanner {
                calls: calls.clone(),
                paths: self.paths.into_iter().collect(),
                path: PlannedPath::default(),
            };
            let clipper = MockClipper {
                calls: calls.clone(),
                offsets: self.offsets.into_iter().collect(),
                robot_lost_on_offset: if self.robot_lost_on_offset {
                    Some(robot.clone())
                } else {
                    None
                },
            };
            let actuator = MockActuator {
                calls: calls.clone(),
                robot: robot.clone(),
                gate: self.gate,
                times_out: self.actuation_times_out,
            };

            let mgr = StepExecMgr::new(
                StepExecParams::default(),
                Box::new(planner),
                Arc::new(MockPoseSource {
                    calls: calls.clone(),
                    robot: robot.clone(),
                }),
                Box::new(clipper),
                Box::new(actuator),
            )
            .unwrap();

            Harness { mgr, calls, robot }
        }
    }

    impl Harness {
        /// Collect reports until the current walk finishes.
        fn wait_for_walk(&self) -> (Vec<ExecReport>, WalkOutcome) {
            let mut reports = Vec::new();
            loop {
                match self.mgr.recv_report(WAIT).unwrap() {
                    Some(ExecReport::WalkFinished(o)) => return (reports, o),
                    Some(r) => reports.push(r),
                    None => panic!("Walk did not finish, reports so far: {:?}", reports),
                }
            }
        }

        fn num_steps(&self) -> usize {
            self.calls.steps.lock().unwrap().len()
        }
    }

    /// A straight path starting on the right foot at the robot's default stance.
    fn straight_path(len: usize) -> PlannedPath {
        PlannedPath::new(
            (0..len)
                .map(|i| {
                    if i % 2 == 0 {
                        FootstepState::new(0.1 * i as f64, -0.1, 0.0, Leg::Right)
                    } else {
                        FootstepState::new(0.1 * i as f64, 0.1, 0.0, Leg::Left)
                    }
                })
                .collect(),
        )
        .unwrap()
    }

    fn goal() -> NavGoal {
        NavGoal {
            x_m: 1.0,
            y_m: 0.0,
            theta_rad: 0.0,
        }
    }

    fn map(frame_id: &str) -> OccupancyGrid {
        OccupancyGrid {
            frame_id: frame_id.into(),
            resolution_m: 0.05,
            width: 2,
            height: 2,
            origin: [0.0, 0.0, 0.0],
            data: vec![0, 0, 100, -1],
        }
    }

    fn states(reports: &[ExecReport]) -> Vec<ExecState> {
        reports
            .iter()
            .filter_map(|r| match r {
                ExecReport::StateChange(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_walks_whole_path() {
        let h = Setup {
            paths: vec![straight_path(5)],
            ..Default::default()
        }
        .start();

        assert_eq!(h.mgr.submit_goal(goal()).unwrap(), GoalResponse::Accepted);
        let (reports, outcome) = h.wait_for_walk();

        assert_eq!(outcome, WalkOutcome::PathCompleted);
        assert_eq!(
            states(&reports),
            vec![ExecState::Planning, ExecState::Executing, ExecState::Idle]
        );
        assert_eq!(h.calls.clips.lock().unwrap().len(), 4);
        assert_eq!(h.num_steps(), 4);
        assert_eq!(h.calls.replan.load(Ordering::SeqCst), 0);
        assert!(!h.mgr.is_executing());
        assert_eq!(h.mgr.state().unwrap(), ExecState::Idle);

        let last = straight_path(5);
        for target in &last.states()[3..] {
            let foot = h.robot.foot(target.leg);
            assert!((foot.x_m - target.x_m).abs() < EPS);
            assert!((foot.y_m - target.y_m).abs() < EPS);
        }
    }

    #[test]
    fn test_first_step_from_support_foot() {
        let path = PlannedPath::new(vec![
            FootstepState::new(0.0, 0.0, 0.0, Leg::Right),
            FootstepState::new(0.1, 0.05, 0.0, Leg::Left),
        ])
        .unwrap();
        let h = Setup {
            paths: vec![path],
            right: FootstepState::new(0.0, 0.0, 0.0, Leg::Right),
            ..Default::default()
        }
        .start();

        h.mgr.submit_goal(goal()).unwrap();
        let (_, outcome) = h.wait_for_walk();

        assert_eq!(outcome, WalkOutcome::PathCompleted);
        let steps = h.calls.steps.lock().unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].leg, Leg::Left);
        assert!((steps[0].dx_m - 0.1).abs() < EPS);
        assert!((steps[0].dy_m - 0.05).abs() < EPS);
        assert!(steps[0].dtheta_rad.abs() < EPS);
    }

    #[test]
    fn test_rejected_step_replans_once() {
        let h = Setup {
            paths: vec![straight_path(5)],
            offsets: vec![(0.01, 0.0, 0.0)],
            ..Default::default()
        }
        .start();

        h.mgr.submit_goal(goal()).unwrap();
        let (reports, outcome) = h.wait_for_walk();

        assert_eq!(outcome, WalkOutcome::ReplanningFailed);
        assert_eq!(
            states(&reports),
            vec![
                ExecState::Planning,
                ExecState::Executing,
                ExecState::Replanning,
                ExecState::Failed,
                ExecState::Idle
            ]
        );
        assert_eq!(h.calls.replan.load(Ordering::SeqCst), 1);
        assert_eq!(h.num_steps(), 0);
        assert!(reports
            .iter()
            .any(|r| matches!(r, ExecReport::StepRejected { clipped: Some(_), .. })));
        assert!(!h.mgr.is_executing());
    }

    #[test]
    fn test_replan_continues_walk() {
        let h = Setup {
            paths: vec![straight_path(3), straight_path(3)],
            offsets: vec![(0.0, 0.0, 0.0), (0.0, 0.02, 0.0)],
            ..Default::default()
        }
        .start();

        h.mgr.submit_goal(goal()).unwrap();
        let (reports, outcome) = h.wait_for_walk();

        assert_eq!(outcome, WalkOutcome::PathCompleted);
        assert_eq!(
            states(&reports),
            vec![
                ExecState::Planning,
                ExecState::Executing,
                ExecState::Replanning,
                ExecState::Executing,
                ExecState::Idle
            ]
        );
        assert_eq!(h.calls.set_start.load(Ordering::SeqCst), 2);
        assert_eq!(h.calls.replan.load(Ordering::SeqCst), 1);
        // One step before the rejection, then the new path from the start
        assert_eq!(h.num_steps(), 3);
    }

    #[test]
    fn test_lost_feet_while_replanning() {
        let h = Setup {
            paths: vec![straight_path(5), straight_path(5)],
            offsets: vec![(0.0, 0.0, 0.1)],
            robot_lost_on_offset: true,
            ..Default::default()
        }
        .start();
        let t = Utc.ymd(2024, 1, 1).and_hms(12, 0, 0);
        h.mgr.update_robot_time(t).unwrap();

        h.mgr.submit_goal(goal()).unwrap();
        let (reports, outcome) = h.wait_for_walk();

        assert_eq!(outcome, WalkOutcome::StartPoseUnavailable);
        assert_eq!(
            states(&reports)[2..],
            [ExecState::Replanning, ExecState::Failed, ExecState::Idle]
        );
        assert_eq!(h.calls.set_start.load(Ordering::SeqCst), 1);
        assert_eq!(h.calls.replan.load(Ordering::SeqCst), 0);
        assert_eq!(h.num_steps(), 0);
        assert!(!h.mgr.is_executing());

        // The failed lookups left the snapshot from the first start in place
        let snapshot = h.mgr.pose_snapshot().unwrap();
        assert_eq!(snapshot.stamp, Some(t));
        assert!((snapshot.right.unwrap().position_m[1] + 0.1).abs() < EPS);
        assert!((snapshot.left.unwrap().position_m[1] - 0.1).abs() < EPS);
    }

    #[test]
    fn test_actuation_timeout_replans() {
        let h = Setup {
            paths: vec![straight_path(5), straight_path(5)],
            actuation_times_out: true,
            ..Default::default()
        }
        .start();

        h.mgr.submit_goal(goal()).unwrap();
        let (reports, outcome) = h.wait_for_walk();

        assert_eq!(outcome, WalkOutcome::ReplanningFailed);
        assert_eq!(
            states(&reports),
            vec![
                ExecState::Planning,
                ExecState::Executing,
                ExecState::Replanning,
                ExecState::Executing,
                ExecState::Replanning,
                ExecState::Failed,
                ExecState::Idle
            ]
        );

        // Each path is abandoned on its first step
        let failed = reports
            .iter()
            .filter(|r| matches!(r, ExecReport::StepFailed(_)))
            .count();
        assert_eq!(failed, 2);
        assert_eq!(h.calls.clips.lock().unwrap().len(), 2);
        assert_eq!(h.calls.replan.load(Ordering::SeqCst), 2);
        assert_eq!(h.num_steps(), 0);
        assert!(!reports
            .iter()
            .any(|r| matches!(r, ExecReport::StepPerformed(_))));
    }

    #[test]
    fn test_start_looked_up_at_robot_time() {
        let h = Setup {
            paths: vec![straight_path(3)],
            ..Default::default()
        }
        .start();
        let t0 = Utc.ymd(2024, 1, 1).and_hms(12, 0, 0);
        let t1 = Utc.ymd(2024, 1, 1).and_hms(12, 0, 2);

        assert_eq!(h.mgr.pose_snapshot().unwrap(), RobotPoseSnapshot::default());

        h.mgr.update_robot_time(t1).unwrap();
        h.mgr.update_robot_time(t0).unwrap();
        h.mgr.submit_goal(goal()).unwrap();
        let (_, outcome) = h.wait_for_walk();
        assert_eq!(outcome, WalkOutcome::PathCompleted);

        let lookups = h.calls.lookups.lock().unwrap();
        assert_eq!(lookups.len(), 4);
        assert!(lookups[..2].iter().all(|(_, at)| *at == LookupTime::At(t1)));
        assert!(lookups[2..].iter().all(|(_, at)| *at == LookupTime::Latest));

        let snapshot = h.mgr.pose_snapshot().unwrap();
        assert_eq!(snapshot.stamp, Some(t1));
        assert!(snapshot.left.is_some() && snapshot.right.is_some());
    }

    #[test]
    fn test_map_moves_world_frame() {
        let h = Setup {
            paths: vec![straight_path(3)],
            ..Default::default()
        }
        .start();

        h.mgr.update_map(map("odom")).unwrap();
        h.mgr.submit_goal(goal()).unwrap();
        let (_, outcome) = h.wait_for_walk();
        assert_eq!(outcome, WalkOutcome::PathCompleted);

        assert_eq!(*h.calls.maps.lock().unwrap(), vec!["odom".to_string()]);
        let lookups = h.calls.lookups.lock().unwrap();
        assert!(!lookups.is_empty());
        assert!(lookups.iter().all(|(world, _)| world == "odom"));
    }

    #[test]
    fn test_worker_error_clears_executing() {
        let mut h = Setup {
            paths: vec![straight_path(3)],
            ..Default::default()
        }
        .start();

        // Poison the state lock so the worker fails on its first state change
        let shared = h.mgr.shared.clone();
        thread::spawn(move || {
            let _state = shared.state.write().unwrap();
            panic!("poisoning the state lock");
        })
        .join()
        .ok();

        assert_eq!(h.mgr.submit_goal(goal()).unwrap(), GoalResponse::Accepted);
        assert!(matches!(
            h.mgr.recv_report(WAIT),
            Err(StepExecError::WorkerStopped)
        ));

        assert!(!h.mgr.is_executing());
        assert!(matches!(
            h.mgr.submit_goal(goal()),
            Err(StepExecError::WorkerStopped)
        ));
        assert!(matches!(h.mgr.stop(), Err(StepExecError::PoisonError)));
    }

    #[test]
    fn test_lost_feet_while_planning() {
        let h = Setup {
            paths: vec![straight_path(5)],
            ..Default::default()
        }
        .start();
        h.robot.lookups_fail.store(true, Ordering::SeqCst);

        h.mgr.submit_goal(goal()).unwrap();
        let (reports, outcome) = h.wait_for_walk();

        assert_eq!(outcome, WalkOutcome::StartPoseUnavailable);
        assert_eq!(states(&reports), vec![ExecState::Planning, ExecState::Idle]);
        assert_eq!(h.calls.plan.load(Ordering::SeqCst), 0);
        assert!(!h.mgr.is_executing());
    }

    #[test]
    fn test_goal_rejected_while_walking() {
        let (gate_tx, gate_rx) = channel();
        let h = Setup {
            paths: vec![straight_path(5)],
            gate: Some(gate_rx),
            ..Default::default()
        }
        .start();

        assert_eq!(h.mgr.submit_goal(goal()).unwrap(), GoalResponse::Accepted);
        assert_eq!(h.mgr.submit_goal(goal()).unwrap(), GoalResponse::Busy);
        assert!(h.mgr.is_executing());

        drop(gate_tx);
        let (_, outcome) = h.wait_for_walk();

        assert_eq!(outcome, WalkOutcome::PathCompleted);
        assert_eq!(h.calls.set_goal.load(Ordering::SeqCst), 1);
        assert_eq!(h.num_steps(), 4);

        // Idle again, the next goal is accepted (and fails as the planner has no more paths)
        assert_eq!(h.mgr.submit_goal(goal()).unwrap(), GoalResponse::Accepted);
        let (_, outcome) = h.wait_for_walk();
        assert_eq!(outcome, WalkOutcome::PlanningFailed);
        assert_eq!(h.calls.set_goal.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stop_abandons_walk() {
        let (gate_tx, gate_rx) = channel();
        let mut h = Setup {
            paths: vec![straight_path(5)],
            gate: Some(gate_rx),
            ..Default::default()
        }
        .start();

        h.mgr.submit_goal(goal()).unwrap();

        // Wait for the first step to be checked, the worker is then blocked performing it
        let start = Instant::now();
        while h.calls.clips.lock().unwrap().is_empty() {
            assert!(start.elapsed() < WAIT, "First step never checked");
            thread::sleep(Duration::from_millis(1));
        }

        h.mgr.request_stop();
        drop(gate_tx);

        let (_, outcome) = h.wait_for_walk();
        assert_eq!(outcome, WalkOutcome::Stopped);
        assert_eq!(h.num_steps(), 1);

        h.mgr.stop().unwrap();
        assert!(matches!(
            h.mgr.try_recv_report(),
            Err(StepExecError::WorkerStopped)
        ));
    }
}

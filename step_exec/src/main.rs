//! Main footstep execution executable entry point.
//!
//! # Architecture
//!
//! The executable connects to the planner, the pose server and the robot's step services, then
//! hands them to the [`StepExecMgr`] which walks on its own worker thread. The main loop only:
//!
//!     - Receives goals and maps from the navigation socket and passes them to the manager
//!     - Logs the reports coming back from the manager

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

// Internal
use comms_if::{
    nav::NavInput,
    net::{zmq, NetParams},
};
use step_lib::{
    clients::{ClipClient, NavClient, PlannerClient, PoseClient, StepClient},
    exec_mgr::{ExecReport, GoalResponse, StepExecMgr},
    params::StepExecParams,
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("step_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Footstep Execution Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: StepExecParams =
        util::params::load("step_exec.toml").wrap_err("Could not load step_exec params")?;
    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");
    info!(
        "    Feet frames: {} (right), {} (left)",
        exec_params.rfoot_frame_id, exec_params.lfoot_frame_id
    );
    info!("    World frame: {}", exec_params.world_frame_id);
    info!("    Step accuracy: {:?}\n", exec_params.accuracy);

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = zmq::Context::new();

    let planner_client =
        PlannerClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise PlannerClient")?;
    info!("PlannerClient initialised");

    let pose_client =
        PoseClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise PoseClient")?;
    info!("PoseClient initialised");

    let clip_client =
        ClipClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise ClipClient")?;
    info!("ClipClient initialised");

    let step_client =
        StepClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise StepClient")?;
    info!("StepClient initialised");

    let nav_client =
        NavClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise NavClient")?;
    info!("NavClient initialised");

    info!("Network initialisation complete\n");

    // ---- INITIALISE EXEC MANAGER ----

    let cycle_period = exec_params.cycle_period();

    let mut step_exec_mgr = StepExecMgr::new(
        exec_params,
        Box::new(planner_client),
        Arc::new(pose_client),
        Box::new(clip_client),
        Box::new(step_client),
    )
    .wrap_err("Failed to start the StepExecMgr")?;

    info!("Waiting for goals\n");

    // ---- MAIN LOOP ----

    'main: loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- NAVIGATION INPUT ----

        loop {
            match nav_client.recv_input() {
                Ok(Some(NavInput::Goal(goal))) => match step_exec_mgr.submit_goal(goal) {
                    Ok(GoalResponse::Accepted) => info!(
                        "Goal ({:.3}, {:.3}, {:.3}) accepted",
                        goal.x_m, goal.y_m, goal.theta_rad
                    ),
                    Ok(GoalResponse::Busy) => warn!("Goal rejected, a walk is in progress"),
                    Err(e) => {
                        error!("Could not submit goal: {}", e);
                        break 'main;
                    }
                },
                Ok(Some(NavInput::Map(map))) => {
                    info!("New map received in frame {}", map.frame_id);
                    if let Err(e) = step_exec_mgr.update_map(map) {
                        error!("Could not pass the map on: {}", e);
                        break 'main;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("NavClient error: {}", e);
                    break;
                }
            }
        }

        // ---- EXECUTION REPORTS ----

        loop {
            match step_exec_mgr.try_recv_report() {
                Ok(Some(ExecReport::StepRejected {
                    requested,
                    clipped: Some(clipped),
                })) => debug!("Step {} rejected, robot can only do {}", requested, clipped),
                Ok(Some(report)) => debug!("{:?}", report),
                Ok(None) => break,
                Err(e) => {
                    error!("StepExecMgr error: {}", e);
                    break 'main;
                }
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }
    }

    // ---- SHUTDOWN ----

    step_exec_mgr
        .stop()
        .wrap_err("StepExecMgr did not stop cleanly")?;

    info!("End of execution");

    session.exit();

    Ok(())
}

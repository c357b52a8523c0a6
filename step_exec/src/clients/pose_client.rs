//! # Pose Client
//!
//! Subscribes to the robot's pose server. A background thread keeps the latest transform of every
//! published frame, lookups wait on the buffer until a suitable transform arrives or the timeout
//! expires.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use comms_if::{
    eqpt::pose::{PoseMsg, StampedTransform},
    net::{zmq, MonitoredSocket, NetParams, RequestError, SocketOptions},
};
use log::{error, warn};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use super::ClientError;
use crate::pose::{FootTransform, LookupTime, PoseError, PoseSource, RobotTime};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout of the background thread, bounds how long shutdown takes.
const RECV_TIMEOUT_MS: i32 = 50;

/// Attitudes with a smaller norm cannot be normalised.
const MIN_QUAT_NORM: f64 = 1e-6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct PoseClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    buffer: Arc<PoseBuffer>,
}

/// Latest transform of each frame.
#[derive(Default)]
struct PoseBuffer {
    transforms: Mutex<HashMap<String, StampedTransform>>,
    updated: Condvar,
    robot_time: Mutex<Option<RobotTime>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PoseClient {
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, ClientError> {
        let socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            SocketOptions::subscriber(RECV_TIMEOUT_MS),
            &params.pose_endpoint,
        )?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let buffer = Arc::new(PoseBuffer::default());

        let bg_run_clone = bg_run.clone();
        let buffer_clone = buffer.clone();

        let bg_jh = thread::Builder::new()
            .name("pose_client::bg".into())
            .spawn(move || bg_thread(socket, bg_run_clone, buffer_clone))
            .map_err(ClientError::SpawnError)?;

        Ok(Self {
            bg_jh: Some(bg_jh),
            bg_run,
            buffer,
        })
    }
}

impl PoseSource for PoseClient {
    fn lookup(
        &self,
        foot_frame_id: &str,
        world_frame_id: &str,
        at: LookupTime,
        timeout: Duration,
    ) -> Result<FootTransform, PoseError> {
        if !self.bg_run.load(Ordering::Relaxed) {
            return Err(PoseError::SourceStopped);
        }

        self.buffer
            .wait_for(foot_frame_id, world_frame_id, at, timeout)
    }

    fn latest_robot_time(&self) -> Option<RobotTime> {
        match self.buffer.robot_time.lock() {
            Ok(t) => *t,
            Err(_) => None,
        }
    }
}

impl Drop for PoseClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                warn!("Pose client background thread panicked");
            }
        }
    }
}

impl PoseBuffer {
    fn insert(&self, tf: StampedTransform) -> Result<(), PoseError> {
        self.transforms.lock()?.insert(tf.frame_id.clone(), tf);
        self.updated.notify_all();
        Ok(())
    }

    fn set_robot_time(&self, stamp: RobotTime) -> Result<(), PoseError> {
        let mut robot_time = self.robot_time.lock()?;
        if robot_time.map_or(true, |t| stamp > t) {
            *robot_time = Some(stamp);
        }
        Ok(())
    }

    /// Block until a transform of `foot` in `world` valid for `at` is available.
    fn wait_for(
        &self,
        foot: &str,
        world: &str,
        at: LookupTime,
        timeout: Duration,
    ) -> Result<FootTransform, PoseError> {
        let deadline = Instant::now() + timeout;
        let mut transforms = self.transforms.lock()?;

        loop {
            if let Some(tf) = transforms.get(foot) {
                let recent_enough = match at {
                    LookupTime::Latest => true,
                    LookupTime::At(t) => tf.stamp >= t,
                };

                if tf.parent_frame_id == world && recent_enough {
                    return Ok(to_foot_transform(tf));
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(PoseError::Timeout {
                    foot: foot.into(),
                    world: world.into(),
                });
            }

            transforms = self.updated.wait_timeout(transforms, deadline - now)?.0;
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn to_foot_transform(tf: &StampedTransform) -> FootTransform {
    let [x, y, z, w] = tf.attitude_q;
    let p = tf.position_m;

    FootTransform {
        position_m: Vector3::new(p[0], p[1], p[2]),
        attitude_q: UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)),
        stamp: Some(tf.stamp),
    }
}

/// Check a transform can be converted into a foot pose.
fn is_valid_transform(tf: &StampedTransform) -> bool {
    let [x, y, z, w] = tf.attitude_q;

    tf.position_m.iter().all(|v| v.is_finite())
        && tf.attitude_q.iter().all(|v| v.is_finite())
        && Quaternion::new(w, x, y, z).norm() > MIN_QUAT_NORM
}

/// Background thread, stores everything the pose server publishes.
fn bg_thread(socket: MonitoredSocket, run: Arc<AtomicBool>, buffer: Arc<PoseBuffer>) {
    while run.load(Ordering::Relaxed) {
        let result = match socket.recv_json::<PoseMsg>() {
            Ok(Some(PoseMsg::Transform(tf))) if !is_valid_transform(&tf) => {
                warn!(
                    "Invalid transform of {} from the pose server: {:?} {:?}",
                    tf.frame_id, tf.position_m, tf.attitude_q
                );
                Ok(())
            }
            Ok(Some(PoseMsg::Transform(tf))) => buffer.insert(tf),
            Ok(Some(PoseMsg::RobotPose { stamp })) => buffer.set_robot_time(stamp),
            Ok(None) => Ok(()),
            Err(e @ RequestError::DeserializeError(_)) | Err(e @ RequestError::NonUtf8Response) => {
                warn!("Invalid message from the pose server: {}", e);
                Ok(())
            }
            Err(e) => {
                error!("Could not receive from the pose server: {}", e);
                break;
            }
        };

        if let Err(e) = result {
            error!("Could not store pose data: {}", e);
            break;
        }
    }

    run.store(false, Ordering::Relaxed);
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

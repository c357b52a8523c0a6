//! Publish a navigation goal to a running footstep executable.
//!
//! ```text
//! send_goal 1.5 -0.2 0.3
//! ```

use color_eyre::{eyre::WrapErr, Report};
use comms_if::{
    nav::{NavGoal, NavInput},
    net::{zmq, MonitoredSocket, SocketOptions},
};
use std::{thread, time::Duration};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(
    name = "send_goal",
    about = "Send a footstep navigation goal",
    setting = structopt::clap::AppSettings::AllowNegativeNumbers
)]
struct Opt {
    #[structopt(flatten)]
    goal: NavGoal,

    /// Endpoint of the executable's navigation socket
    #[structopt(short, long, default_value = "tcp://localhost:5030")]
    endpoint: String,

    /// Time to wait after connecting before publishing, so the subscription can propagate
    #[structopt(long, default_value = "500")]
    settle_ms: u64,
}

fn main() -> Result<(), Report> {
    let opt = Opt::from_args();

    let ctx = zmq::Context::new();
    let socket = MonitoredSocket::new(
        &ctx,
        zmq::PUB,
        SocketOptions {
            block_on_first_connect: true,
            connect_timeout: 2000,
            linger: 1000,
            ..Default::default()
        },
        &opt.endpoint,
    )
    .wrap_err("Could not connect to the footstep executable")?;

    thread::sleep(Duration::from_millis(opt.settle_ms));

    let msg = serde_json::to_string(&NavInput::Goal(opt.goal))?;
    socket
        .send(msg.as_str(), 0)
        .wrap_err("Could not send the goal")?;

    println!(
        "Goal ({}, {}, {}) sent to {}",
        opt.goal.x_m, opt.goal.y_m, opt.goal.theta_rad, opt.endpoint
    );

    Ok(())
}

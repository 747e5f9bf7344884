//! # Session Loops
//!
//! Drive an endpoint over a [`LineTransport`] until the link ends, then
//! report on the session. A transport disconnect is an ordinary way for a
//! session to end, so neither loop returns an error.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::{interval, timeout_at, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::controller::{ControllerEndpoint, Decide};
use crate::link::{LinkState, LinkStats, LivenessMonitor, SessionEnd, SessionReport};
use crate::robot::hardware::{LightDriver, MotorDriver, SensorSource, ServoDriver};
use crate::robot::RobotEndpoint;
use crate::serial::LineTransport;

/// Current time on the runtime clock, so paused-time tests stay deterministic
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// How long the controller keeps reading after a session ends, so replies
/// already in flight are counted
pub const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Run one controller session.
///
/// Sends the neutral prompt, then answers each sensor frame with one command
/// frame. A watchdog tick every `watchdog_period` samples input and checks
/// liveness. Inbound lines are always handled before the watchdog in the same
/// wake-up, so a frame that has already arrived can never be reported as
/// missing.
pub async fn run_controller<T, D, F>(
    transport: &mut T,
    endpoint: &mut ControllerEndpoint<D>,
    watchdog_period: Duration,
    shutdown: F,
) -> SessionReport
where
    T: LineTransport + ?Sized,
    D: Decide,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let prompt = endpoint.initial_prompt();
    if let Err(e) = transport.send_line(&prompt).await {
        warn!("Could not send initial prompt: {}", e);
        return endpoint.report(SessionEnd::Disconnected);
    }
    endpoint.start(now());

    let mut watchdog = interval(watchdog_period);
    watchdog.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let end = loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested");
                break SessionEnd::StopRequested;
            }

            received = transport.recv_line() => {
                let line = match received {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Robot closed the link");
                        break SessionEnd::Disconnected;
                    }
                    Err(e) => {
                        warn!("Link read failed: {}", e);
                        break SessionEnd::Disconnected;
                    }
                };

                let reply = match endpoint.on_frame_received(&line, now()) {
                    Ok(reply) => reply,
                    Err(e) => {
                        error!("Decision failed: {}", e);
                        break SessionEnd::DecisionFailed;
                    }
                };

                if let Err(e) = transport.send_line(&reply).await {
                    warn!("Link write failed: {}", e);
                    break SessionEnd::Disconnected;
                }
            }

            _ = watchdog.tick() => {
                if let Some(end) = endpoint.tick(now()) {
                    break end;
                }
            }
        }
    };

    if end != SessionEnd::Disconnected {
        drain(transport, endpoint).await;
    }

    let report = endpoint.report(end);
    info!(
        "Session ended ({:?}): {} packets, {} rejected",
        report.end, report.packets, report.rejected
    );
    report
}

/// Read whatever arrives within [`DRAIN_GRACE`] without answering it.
async fn drain<T, D>(transport: &mut T, endpoint: &mut ControllerEndpoint<D>)
where
    T: LineTransport + ?Sized,
    D: Decide,
{
    let deadline = tokio::time::Instant::now() + DRAIN_GRACE;
    while let Ok(Ok(Some(line))) = timeout_at(deadline, transport.recv_line()).await {
        debug!("Late sensor frame {:?}", line);
        endpoint.on_late_frame(&line, now());
    }
}

/// Run one robot session: connect, answer every command line, disconnect.
///
/// The robot keeps its own liveness watchdog, so a host that goes silent
/// without closing the link still stops the tracks once `timeout` expires.
pub async fn run_robot<T, M, V, L, S, F>(
    transport: &mut T,
    robot: &mut RobotEndpoint<M, V, L, S>,
    timeout: Duration,
    watchdog_period: Duration,
    shutdown: F,
) -> SessionReport
where
    T: LineTransport + ?Sized,
    M: MotorDriver,
    V: ServoDriver,
    L: LightDriver,
    S: SensorSource,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let started_at = chrono::Utc::now();
    let mut stats = LinkStats::new();
    let mut liveness = LivenessMonitor::new(timeout);
    robot.on_connected();
    liveness.start(now());

    let mut watchdog = interval(watchdog_period);
    watchdog.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let end = loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested");
                break SessionEnd::StopRequested;
            }

            received = transport.recv_line() => {
                let line = match received {
                    Ok(Some(line)) => line,
                    Ok(None) => break SessionEnd::Disconnected,
                    Err(e) => {
                        warn!("Link read failed: {}", e);
                        break SessionEnd::Disconnected;
                    }
                };

                let arrived = now();
                stats.record(arrived);
                liveness.record_frame(arrived);
                let reply = robot.on_frame_received(&line);
                if let Err(e) = transport.send_line(&reply).await {
                    warn!("Link write failed: {}", e);
                    break SessionEnd::Disconnected;
                }
            }

            _ = watchdog.tick() => {
                if liveness.check(now()) == LinkState::Lost {
                    info!("Host went silent");
                    break SessionEnd::LinkLost;
                }
            }
        }
    };

    robot.on_disconnected();
    let (_, rejected) = robot.counts();
    SessionReport::new(started_at, end, &stats, rejected)
}

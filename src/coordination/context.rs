// SPDX-License-Identifier: GPL-3.0-only

//! Shared state of the running controller

use super::activity::ActivityClock;
use super::arbiter::CameraArbiter;
use super::blink::BlinkSignal;
use super::capture::CapturePipeline;
use super::clock::Clock;
use super::liveness::{ClientLiveness, ClientLivenessMonitor};
use super::power::{PowerPolicy, PowerStateMachine};
use crate::config::Config;
use crate::hardware::{Hardware, Led, PowerControl};
use crate::storage::ImageStore;
use std::sync::Arc;
use std::time::Duration;

/// Everything handlers, buttons and background loops share
///
/// Built once at startup and passed around behind an `Arc`.
pub struct DeviceContext {
    pub clock: Arc<dyn Clock>,
    pub activity: Arc<ActivityClock>,
    pub liveness: Arc<ClientLiveness>,
    pub liveness_monitor: ClientLivenessMonitor,
    pub liveness_interval: Duration,
    pub arbiter: Arc<CameraArbiter>,
    pub power_machine: Arc<PowerStateMachine>,
    pub blink: BlinkSignal,
    pub capture: Arc<CapturePipeline>,
    pub uv_a: Arc<dyn Led>,
    pub uv_b: Arc<dyn Led>,
    pub indicator: Arc<dyn Led>,
    pub power: Arc<dyn PowerControl>,
    pub poweroff_delay: Duration,
    pub store: ImageStore,
    pub version: String,
}

impl DeviceContext {
    pub fn new(hardware: Hardware, config: &Config, clock: Arc<dyn Clock>, store: ImageStore) -> Self {
        let Hardware {
            camera,
            uv_a,
            uv_b,
            indicator,
            power,
        } = hardware;

        let activity = Arc::new(ActivityClock::new(Arc::clone(&clock)));
        let liveness = Arc::new(ClientLiveness::new(Arc::clone(&clock)));
        let arbiter = Arc::new(CameraArbiter::new(camera));

        let power_machine = Arc::new(PowerStateMachine::new(
            Arc::clone(&activity),
            Arc::clone(&liveness),
            [Arc::clone(&uv_a), Arc::clone(&uv_b)],
            Arc::clone(&power),
            PowerPolicy::from(&config.power),
        ));

        let capture = Arc::new(CapturePipeline::new(
            Arc::clone(&arbiter),
            Arc::clone(&activity),
            Arc::clone(&liveness),
            Arc::clone(&indicator),
            store.clone(),
            config.feedback.capture_hold(),
        ));

        Self {
            liveness_monitor: ClientLivenessMonitor::new(
                Arc::clone(&liveness),
                config.liveness.client_timeout(),
            ),
            liveness_interval: config.liveness.check_interval(),
            blink: BlinkSignal::new(
                Arc::clone(&indicator),
                config.feedback.blink_count,
                config.feedback.blink_period(),
            ),
            poweroff_delay: config.power.poweroff_delay(),
            version: crate::version().to_string(),
            clock,
            activity,
            liveness,
            arbiter,
            power_machine,
            capture,
            uv_a,
            uv_b,
            indicator,
            power,
            store,
        }
    }
}

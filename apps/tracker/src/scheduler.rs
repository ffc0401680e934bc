//! Periodic auto-refresh.
//!
//! The timer lives on the runtime but never refreshes directly: each tick
//! posts `trigger_refresh` onto the UI loop, like a button press would.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use shareprofit_core::refresh::{ChannelUiExecutor, RefreshOrchestrator, TriggerOutcome, UiExecutor};

pub fn start_auto_refresh(
    runtime: &Handle,
    period: Duration,
    executor: ChannelUiExecutor,
    orchestrator: RefreshOrchestrator,
) {
    runtime.spawn(async move {
        info!("Auto-refresh every {:?}", period);
        let mut ticks = interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            let orchestrator = orchestrator.clone();
            let posted = executor.post(Box::new(move || {
                if orchestrator.trigger_refresh() == TriggerOutcome::AlreadyRunning {
                    debug!("Scheduled refresh skipped: previous one still running");
                }
            }));
            if posted.is_err() {
                warn!("UI loop gone, stopping auto-refresh");
                break;
            }
        }
    });
}

//! Background refresh cycles and their hand-off to the UI thread.

mod executor;
mod listener;
mod orchestrator;
mod state;

#[cfg(test)]
mod orchestrator_tests;

pub use executor::{ui_channel, ChannelUiExecutor, UiEventLoop, UiExecutor, UiJob};
pub use listener::{NoOpListener, RefreshListener};
pub use orchestrator::RefreshOrchestrator;
pub use state::{PortfolioState, RefreshReport, RefreshState, TriggerOutcome};

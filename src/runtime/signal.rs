//! Bridge from process signals to the run interrupt.

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::core::Interrupt;

/// Raise `interrupt` on the first Ctrl-C.
///
/// Must be called from within a tokio runtime. The returned task ends after
/// the first signal; abort it once the run is over.
#[must_use]
pub fn spawn_interrupt_bridge(interrupt: Interrupt) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received");
                interrupt.raise();
            }
            Err(e) => warn!(error = %e, "cannot listen for interrupts"),
        }
    })
}

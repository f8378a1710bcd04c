use std::sync::atomic::{AtomicBool, Ordering};

/// Global shutdown flag for graceful termination.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Check if shutdown has been requested.
#[inline]
pub(crate) fn is_shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::Acquire)
}

#[inline]
fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::Release);
}

/// Set up the Ctrl+C handler.
///
/// The first Ctrl+C lets the current repository finish and stops the run
/// before the next one; a second one exits immediately.
pub(crate) fn setup_shutdown_handler() {
    tokio::spawn(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Could not install Ctrl+C handler: {}", e);
            return;
        }

        tracing::warn!("Shutdown requested, finishing current repository (Ctrl+C again to force quit)");
        request_shutdown();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::error!("Force quit");
            std::process::exit(130);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_flag_is_sticky() {
        request_shutdown();
        assert!(is_shutdown_requested());
        assert!(is_shutdown_requested());
    }
}

use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Detects signals sent to the process and turns them into cancellation. Also returns once
/// cancellation happened for another reason.
///
/// On Windows detached processes can't detect signals sent to them, so `stop` kills them instead.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}

use std::{future::Future, io};

/// Resolves once SIGINT (ctrl-c) or, on unix, SIGTERM arrives.
pub async fn signal() {
    let ctrl_c = wait_for("ctrl-c", tokio::signal::ctrl_c());

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

/// A listener that fails to register never fires, so the server keeps
/// running on the remaining signals.
async fn wait_for<F>(name: &'static str, listener: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = listener.await {
        tracing::error!(error = %e, signal = name, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn delivered_signal_resolves() {
        let res = tokio::time::timeout(
            Duration::from_millis(100),
            wait_for("test", async { Ok(()) }),
        )
        .await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn failed_registration_never_resolves() {
        let failing = async { Err(io::Error::new(io::ErrorKind::Other, "no signal driver")) };

        let res = tokio::time::timeout(Duration::from_millis(50), wait_for("test", failing)).await;
        assert!(res.is_err(), "a broken listener must not trigger shutdown");
    }
}

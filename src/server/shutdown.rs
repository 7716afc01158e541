use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Pairs a handle with the future `serve_with_shutdown` waits on. The server stops once the
/// handle is either used or dropped.
pub(crate) fn shutdown_signal() -> (RpcServerShutdownHandle, RpcServerShutdownSignal) {
    let (tx, rx) = oneshot::channel();

    (RpcServerShutdownHandle { tx }, RpcServerShutdownSignal { rx })
}

pub(crate) struct RpcServerShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl RpcServerShutdownHandle {
    pub fn shutdown(self) {
        // Receiver already gone means the server exited on its own.
        let _ = self.tx.send(());
    }
}

pub(crate) struct RpcServerShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl Future for RpcServerShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Sent or dropped, either one ends the wait.
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn signal_fires_on_explicit_shutdown() {
        let (handle, signal) = shutdown_signal();
        handle.shutdown();

        timeout(Duration::from_millis(100), signal)
            .await
            .expect("signal should resolve");
    }

    #[tokio::test]
    async fn signal_fires_when_handle_dropped() {
        let (handle, signal) = shutdown_signal();
        drop(handle);

        timeout(Duration::from_millis(100), signal)
            .await
            .expect("signal should resolve");
    }

    #[tokio::test]
    async fn signal_pending_while_handle_alive() {
        let (_handle, signal) = shutdown_signal();

        assert!(timeout(Duration::from_millis(20), signal).await.is_err());
    }
}

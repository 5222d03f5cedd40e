//! Background keepalive task, one per connected client.
//!
//! Each cycle the task closes the connection if no caller command ran within
//! the idle timeout, otherwise pings the daemon, then sleeps for the interval
//! or until cancelled. Any failure closes the connection and ends the task;
//! it never reconnects. The task only holds a weak reference so dropping the
//! last client handle also ends it.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::{ClientInner, MpdClient};
use super::error::ClientError;

pub(crate) struct Keepalive {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Keepalive {
    pub(crate) fn spawn(
        client: Weak<ClientInner>,
        interval: Duration,
        idle_timeout: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(client, cancel.clone(), interval, idle_timeout));
        Self { cancel, task }
    }

    /// Signal the task without waiting for it.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel the task and wait until it has exited.
    pub(crate) async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                warn!("Keepalive task panicked: {}", e);
            }
        }
    }
}

async fn run(
    client: Weak<ClientInner>,
    cancel: CancellationToken,
    interval: Duration,
    idle_timeout: Duration,
) {
    loop {
        if cancel.is_cancelled() {
            close(&client).await;
            return;
        }

        let Some(mpd) = MpdClient::upgrade(&client) else {
            return;
        };

        let idle = mpd.idle_for();
        if idle > idle_timeout {
            info!(
                "No commands to {} for {} seconds, closing connection",
                mpd.address(),
                idle.as_secs()
            );
            mpd.close().await;
            return;
        }

        match mpd.ping().await {
            Ok(_) => {}
            Err(ClientError::NotConnected) => {
                debug!("Connection to {} already closed, stopping keepalive", mpd.address());
                return;
            }
            Err(e) => {
                warn!("Error when pinging {}: {}", mpd.address(), e);
                mpd.close().await;
                return;
            }
        }
        drop(mpd);

        tokio::select! {
            _ = cancel.cancelled() => {
                close(&client).await;
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

async fn close(client: &Weak<ClientInner>) {
    if let Some(mpd) = MpdClient::upgrade(client) {
        info!("Stopping keepalive for {}", mpd.address());
        mpd.close().await;
    }
}

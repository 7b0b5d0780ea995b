use std::io::{self, Read};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::app::{App, Flow};
use crate::error::Result;
use crate::input::Decoder;

/// Periodic resample and redraw. Stops once `shutdown` flips to true or
/// its sender is dropped.
pub fn spawn_refresh(
    app: Arc<App>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately; the caller already drew once
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }
            if !app.auto_refresh() {
                continue;
            }

            let app = Arc::clone(&app);
            match tokio::task::spawn_blocking(move || app.refresh_and_draw()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "periodic redraw failed"),
                Err(err) => {
                    warn!(error = %err, "refresh worker panicked");
                    break;
                }
            }
        }
        debug!("refresh task stopped");
    })
}

/// Read raw bytes on a dedicated thread and feed them through the decoder
/// into `App::dispatch`. The receiver resolves when the user quits, input
/// ends, or a read or draw fails.
pub fn spawn_input<R>(app: Arc<App>, reader: R) -> io::Result<oneshot::Receiver<Result<()>>>
where
    R: Read + Send + 'static,
{
    let (done_tx, done_rx) = oneshot::channel();
    thread::Builder::new()
        .name("procdash-input".to_string())
        .spawn(move || {
            let outcome = read_input(&app, reader);
            debug!(ok = outcome.is_ok(), "input thread stopped");
            let _ = done_tx.send(outcome);
        })?;
    Ok(done_rx)
}

fn read_input<R: Read>(app: &App, mut reader: R) -> Result<()> {
    let mut decoder = Decoder::new();
    let mut buf = [0u8; 64];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        for &byte in &buf[..n] {
            if let Some(action) = decoder.feed(byte)
                && app.dispatch(action)? == Flow::Quit
            {
                return Ok(());
            }
        }
    }
}

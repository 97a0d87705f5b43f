use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::output::Reporter;
use crate::regen::Regenerate;
use crate::watcher::{FileWatcher, WatchError, WatchStreams};

/// Watch loop state. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// One watch-mode run over one source file.
///
/// Owns the file watcher; dropping the session (or finishing `run`) releases it.
pub struct WatchSession {
    source: PathBuf,
    watcher: FileWatcher,
    streams: WatchStreams,
}

impl WatchSession {
    /// Start monitoring `source`. Setup failures are returned and end watch mode.
    pub fn start(source: &Path, debounce: Duration) -> Result<Self, WatchError> {
        let (watcher, streams) = FileWatcher::start(source, debounce)?;
        Ok(Self {
            source: watcher.path().to_path_buf(),
            watcher,
            streams,
        })
    }

    /// Regenerate on every settled change until `cancel` resolves.
    ///
    /// The watcher is shut down before returning, whatever the exit path.
    pub async fn run<R, O, E, C>(
        mut self,
        regen: Arc<R>,
        reporter: &mut Reporter<O, E>,
        cancel: C,
    ) -> LoopState
    where
        R: Regenerate,
        O: Write,
        E: Write,
        C: Future<Output = ()>,
    {
        let state = watch_loop(&self.source, &mut self.streams, regen, reporter, cancel).await;
        self.watcher.shutdown();
        reporter.stopping();
        state
    }
}

/// Consume change events and monitor errors one at a time until `cancel` resolves.
///
/// Cancellation is polled first on every iteration, so events already queued are
/// dropped once it fires. A regeneration is awaited to completion before the next
/// event is read: regenerations never overlap and a running one is never
/// interrupted.
pub async fn watch_loop<R, O, E, C>(
    source: &Path,
    streams: &mut WatchStreams,
    regen: Arc<R>,
    reporter: &mut Reporter<O, E>,
    cancel: C,
) -> LoopState
where
    R: Regenerate,
    O: Write,
    E: Write,
    C: Future<Output = ()>,
{
    tokio::pin!(cancel);
    let mut state = LoopState::Running;
    let mut regenerations: u64 = 0;

    while state == LoopState::Running {
        tokio::select! {
            biased;

            () = &mut cancel => {
                tracing::debug!(regenerations, "cancellation requested");
                state = LoopState::Stopped;
            }
            Some(err) = streams.errors.recv() => {
                tracing::warn!(error = %err, "watcher error");
                reporter.watcher_error(&err);
            }
            Some(_change) = streams.changes.recv() => {
                regenerations += 1;
                let regen = Arc::clone(&regen);
                let path = source.to_path_buf();
                match tokio::task::spawn_blocking(move || regen.regenerate(&path)).await {
                    Ok(Ok(output)) => reporter.regenerated(&output),
                    Ok(Err(err)) => {
                        tracing::debug!(phase = %err.phase(), "regeneration failed");
                        reporter.error(&err);
                    }
                    Err(join) => reporter.error(&join),
                }
            }
            else => {
                // Both streams closed: the monitor is gone and nothing can arrive.
                tracing::warn!("watcher streams closed");
                reporter.error(&"watcher stopped unexpectedly");
                state = LoopState::Stopped;
            }
        }
    }
    state
}

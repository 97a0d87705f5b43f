use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::cli::Cli;
use crate::config::Config;
use crate::opener::Opener;
use crate::output::{self, Reporter};
use crate::regen::{Regenerate, Regenerator};
use crate::render::MarkdownRenderer;
use crate::session::WatchSession;
use crate::writer::{self, HtmlWriter};

/// Entry point behind `main`: everything that can fail before watching starts
/// propagates from here and ends the process with a non-zero status.
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("failed to load config")?;
    tracing::debug!(?config, "config loaded");

    if cli.list {
        let files = writer::list_files(&config.output_dir)?;
        output::print_files(&mut std::io::stdout().lock(), &files, cli.json)?;
        return Ok(());
    }

    let Some(file) = cli.file else {
        bail!("markdown file is required");
    };
    preview(&file, cli.watch, &config).await
}

/// Generate once, open the page, then optionally watch.
pub async fn preview(file: &Path, watch: bool, config: &Config) -> Result<()> {
    if !file.exists() {
        bail!("file not found: {}", file.display());
    }
    let source = std::path::absolute(file)
        .with_context(|| format!("failed to resolve {}", file.display()))?;

    let renderer = MarkdownRenderer::new(&config.config_dir, config.theme.as_deref())
        .context("failed to initialize renderer")?;
    let regen = Arc::new(Regenerator::new(renderer, HtmlWriter::new(&config.output_dir)));
    let mut reporter = Reporter::stdio();

    let output = regen.regenerate(&source)?;
    reporter.generated(&output);

    // The viewer is only opened for the first page; regenerations reuse the tab.
    if let Err(err) = Opener::new(&config.browser_command).open(&output) {
        if !watch {
            return Err(err.context("failed to open browser"));
        }
        reporter.error(&format!("failed to open browser: {err:#}"));
    }

    if !watch {
        return Ok(());
    }

    let session = WatchSession::start(&source, config.debounce).context("failed to start watcher")?;
    let shutdown = shutdown_signal();
    reporter.watching();
    session.run(regen, &mut reporter, shutdown).await;
    Ok(())
}

/// Resolves on Ctrl+C, or on SIGTERM where available.
///
/// Handlers are installed when this is called, not when the future is first
/// polled, so a signal arriving right after the call is already caught.
#[cfg(unix)]
pub fn shutdown_signal() -> impl Future<Output = ()> + Send + 'static {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    fn listen(kind: SignalKind, name: &str) -> Option<Signal> {
        signal(kind)
            .inspect_err(|err| tracing::warn!(error = %err, "cannot listen for {name}"))
            .ok()
    }

    async fn recv(signal: Option<Signal>) {
        match signal {
            Some(mut signal) => {
                signal.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    let interrupt = listen(SignalKind::interrupt(), "SIGINT");
    let terminate = listen(SignalKind::terminate(), "SIGTERM");
    async move {
        tokio::select! {
            () = recv(interrupt) => {}
            () = recv(terminate) => {}
        }
    }
}

/// Resolves on Ctrl+C.
#[cfg(not(unix))]
pub fn shutdown_signal() -> impl Future<Output = ()> + Send + 'static {
    async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

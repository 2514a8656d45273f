use std::time::Duration;

use hanlink_pipeline::{run, Pipeline, PipelineConfig, PipelineError, PipelineEvent};
use hanlink_source::ByteSource;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::exit::{io_error, pipeline_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_event, OutputFormat};

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// How long and how persistently to run a pipeline from the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct DriveOptions {
    /// Stop after this many readings.
    pub count: Option<u64>,
    /// Retry failed opens after this delay instead of exiting.
    pub retry_open: Option<Duration>,
}

/// Run `source` through a pipeline until Ctrl-C or the reading count is reached.
pub fn drive<S>(
    source: S,
    config: PipelineConfig,
    options: DriveOptions,
    format: OutputFormat,
) -> CliResult<i32>
where
    S: ByteSource + 'static,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))?;

    let result = runtime.block_on(drive_async(source, config, options, format));
    // A capture file read may still be parked on a blocking thread.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn drive_async<S>(
    mut source: S,
    config: PipelineConfig,
    options: DriveOptions,
    format: OutputFormat,
) -> CliResult<i32>
where
    S: ByteSource + 'static,
{
    let shutdown = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut pipeline = Pipeline::new(config, tx);

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            signal_token.cancel();
        }
    });

    let runner_token = shutdown.clone();
    let runner = tokio::spawn(async move {
        run_with_retry(&mut source, &mut pipeline, &runner_token, options.retry_open).await
    });

    let mut readings = 0u64;
    while let Some(event) = rx.recv().await {
        let limit_reached = options.count.is_some_and(|count| readings >= count);
        if limit_reached {
            continue;
        }

        print_event(&event, format);
        if matches!(event, PipelineEvent::Reading(_)) {
            readings += 1;
            if options.count.is_some_and(|count| readings >= count) {
                info!(readings, "reading limit reached");
                shutdown.cancel();
            }
        }
    }

    match runner.await {
        Ok(Ok(())) => Ok(SUCCESS),
        Ok(Err(err)) => Err(pipeline_error("pipeline stopped", err)),
        Err(err) => Err(CliError::new(INTERNAL, format!("pipeline task failed: {err}"))),
    }
}

async fn run_with_retry<S>(
    source: &mut S,
    pipeline: &mut Pipeline<mpsc::UnboundedSender<PipelineEvent>>,
    shutdown: &CancellationToken,
    retry_open: Option<Duration>,
) -> Result<(), PipelineError>
where
    S: ByteSource,
{
    loop {
        let err = match run(source, pipeline, shutdown).await {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        let Some(delay) = retry_open else {
            return Err(err);
        };

        warn!(error = %err, retry_in = ?delay, "open failed, retrying");
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

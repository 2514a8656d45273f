//! Feed the simulator through the pipeline and print three readings.
//!
//! Run with: `cargo run -p hanlink --example simulated-readings`

use std::time::Duration;

use hanlink::frame::SAMPLE_FRAME;
use hanlink::pipeline::{run, Pipeline, PipelineConfig, PipelineEvent};
use hanlink::source::SimulatedSource;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut source = SimulatedSource::with_interval(SAMPLE_FRAME, Duration::from_millis(500));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut pipeline = Pipeline::new(PipelineConfig::default(), tx);
    let shutdown = CancellationToken::new();

    let token = shutdown.clone();
    let runner = tokio::spawn(async move { run(&mut source, &mut pipeline, &token).await });

    let mut seen = 0;
    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::Reading(reading) => {
                println!(
                    "{}: {} kWh imported, {} kW now",
                    reading.timestamp, reading.active_import_total, reading.active_import
                );
                seen += 1;
                if seen == 3 {
                    shutdown.cancel();
                }
            }
            PipelineEvent::Error(err) => eprintln!("error: {err}"),
        }
    }

    runner.await??;
    Ok(())
}

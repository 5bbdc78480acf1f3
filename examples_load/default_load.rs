use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};

use debug_log::{log, Config, Level, Logger, NoopTransport, OutputMode, RemoteConfig};

#[tokio::main]
async fn main() {
    let config = Config {
        output: OutputMode::File,
        log_file: Some("default_load.log".into()),
        remote_url: Some("http://127.0.0.1:9/ingest".to_string()),
        remote_enabled: true,
        ..Config::default()
    };
    let logger = Logger::with_transport(config, Arc::new(NoopTransport), RemoteConfig::default())
        .expect("valid config");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        log!(logger, Level::Error, "default load test error {}", i);
    }

    let elapsed = start.elapsed();
    println!("default config: sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give the background task a little time to drain the channel
    sleep(Duration::from_secs(2)).await;
    println!("{:?}", logger.stats());
}

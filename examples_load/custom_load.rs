use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};

use debug_log::{log, Config, Level, Logger, NoopTransport, OutputMode, RemoteConfig};

#[tokio::main]
async fn main() {
    let config = Config {
        output: OutputMode::File,
        log_file: Some("custom_load.log".into()),
        json_mode: true,
        remote_url: Some("http://127.0.0.1:9/ingest".to_string()),
        remote_enabled: true,
        ..Config::default()
    };
    let remote_config = RemoteConfig {
        channel_buffer: 50_000,
        timeout: Duration::from_millis(200),
    };
    let logger = Arc::new(
        Logger::with_transport(config, Arc::new(NoopTransport), remote_config).expect("valid config"),
    );

    let n: u64 = 100_000;
    let threads = 4;
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                for i in 0..n / threads {
                    log!(logger, Level::Error, tags: ["load"], "custom load test error {} from {}", i, t);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let elapsed = start.elapsed();
    println!("custom config: sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    sleep(Duration::from_secs(2)).await;
    println!("{:?}", logger.stats());
}

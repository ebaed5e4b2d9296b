// In demos/producer.rs
use dmxp_logsink::{LogError, Logger};
use sha2::{Digest, Sha256};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), LogError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <log_path> <num_records>", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let num_records: usize = args[2].parse().expect("Invalid number of records");

    let keep_going = Arc::new(AtomicBool::new(true));
    let keep_going_for_handler = Arc::clone(&keep_going);

    // Stop submitting on Ctrl+C; the logger still drains and trims on close.
    ctrlc::set_handler(move || {
        keep_going_for_handler.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let logger = Logger::open(path)?;
    println!("Producer: Logging {} records to {}", num_records, path);

    let start = std::time::Instant::now();
    let mut hasher = Sha256::new();

    for i in 0..num_records {
        if !keep_going.load(Ordering::SeqCst) {
            println!("Producer: Interrupted after {} records", i);
            break;
        }
        let line = format!("message_{}", i);
        if logger.log(&line).is_accepted() {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
    }

    let submit_time = start.elapsed();
    let stats = logger.close()?;
    let total_time = start.elapsed();

    let expected = format!("{:x}", hasher.finalize());
    let on_disk = format!("{:x}", Sha256::digest(std::fs::read(path)?));

    println!(
        "Producer: submitted {} (dropped {}) in {:.2?}, closed after {:.2?}",
        stats.submitted, stats.dropped, submit_time, total_time
    );
    println!("Producer: sha256 of accepted records {}", expected);
    println!("Producer: sha256 of log file         {}", on_disk);
    if expected != on_disk {
        eprintln!("Producer: note: digests differ when the file held content before this run");
    }
    Ok(())
}

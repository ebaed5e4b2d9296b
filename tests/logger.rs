#![cfg(unix)]

use dmxp_logsink::{LogError, Logger, LoggerBuilder, SendOutcome};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn lines(path: &Path) -> Vec<String> {
    let content = fs::read_to_string(path).unwrap();
    content.lines().map(str::to_owned).collect()
}

#[test]
fn three_records_persist_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("abc.log");

    let logger = Logger::open(&path).unwrap();
    assert_eq!(logger.log("a"), SendOutcome::Accepted);
    assert_eq!(logger.log("bb"), SendOutcome::Accepted);
    assert_eq!(logger.log("ccc"), SendOutcome::Accepted);
    let stats = logger.close().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"a\nbb\nccc\n");
    assert_eq!(fs::metadata(&path).unwrap().len(), 9);
    assert_eq!(stats.submitted, 3);
    assert_eq!(stats.persisted, 3);
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.bytes_written, 9);
}

#[test]
fn records_keep_order_across_growth() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grow.log");

    let logger = Logger::open(&path).unwrap();
    for i in 0..5_000 {
        assert!(logger.log(format!("record-{i:06}")).is_accepted());
    }
    let stats = logger.close().unwrap();

    let expected: Vec<String> = (0..5_000).map(|i| format!("record-{i:06}")).collect();
    assert_eq!(lines(&path), expected);
    assert!(stats.grows >= 1, "70KB of records must outgrow 4KB");
    assert_eq!(fs::metadata(&path).unwrap().len(), 5_000 * 14);
}

#[test]
fn single_record_larger_than_several_doublings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.log");

    let big = vec![b'Q'; 100_000];
    let logger = Logger::open(&path).unwrap();
    logger.log(b"before");
    logger.log(&big);
    logger.log(b"after");
    logger.close().unwrap();

    let mut expected = b"before\n".to_vec();
    expected.extend_from_slice(&big);
    expected.extend_from_slice(b"\nafter\n");
    assert_eq!(fs::read(&path).unwrap(), expected);
}

#[test]
fn close_trims_to_committed_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trim.log");

    let logger = LoggerBuilder::new()
        .with_initial_file_size(1 << 16)
        .open(&path)
        .unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 1 << 16);

    logger.log("short");
    let stats = logger.close().unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), stats.bytes_written);
    assert_eq!(stats.bytes_written, 6);
}

#[test]
fn drop_drains_and_trims_like_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drop.log");

    {
        let logger = Logger::open(&path).unwrap();
        for i in 0..100 {
            logger.log(format!("{i}"));
        }
    }

    let expected: Vec<String> = (0..100).map(|i| i.to_string()).collect();
    assert_eq!(lines(&path), expected);
}

#[test]
fn reopen_appends_after_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reopen.log");

    let logger = Logger::open(&path).unwrap();
    logger.log("first");
    logger.close().unwrap();

    let logger = Logger::open(&path).unwrap();
    logger.log("second");
    logger.log("third");
    logger.close().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"first\nsecond\nthird\n");
}

#[test]
fn empty_record_is_a_bare_separator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.log");

    let logger = Logger::open(&path).unwrap();
    logger.log("x");
    logger.log("");
    logger.log("y");
    logger.close().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"x\n\ny\n");
}

#[test]
fn burst_past_ring_capacity_drops_without_reordering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("burst.log");

    // Tiny ring and a sleepy worker: most of the burst cannot fit.
    let logger = LoggerBuilder::new()
        .with_ring_size(1024)
        .with_idle_interval(Duration::from_millis(50))
        .open(&path)
        .unwrap();

    let submitted = 2_000u64;
    for i in 0..submitted {
        logger.log(format!("{i:08}-{}", "p".repeat(48)));
    }
    let stats = logger.close().unwrap();

    let persisted: Vec<u64> = lines(&path)
        .iter()
        .map(|line| line[..8].parse().unwrap())
        .collect();

    assert_eq!(stats.submitted, submitted);
    assert!(stats.dropped > 0);
    assert_eq!(stats.dropped + stats.persisted, submitted);
    assert_eq!(persisted.len() as u64, stats.persisted);
    assert!(persisted.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn flush_makes_records_visible_before_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flush.log");

    let logger = Logger::open(&path).unwrap();
    logger.log("durable");
    logger.log("too");
    logger.flush().unwrap();

    let content = fs::read(&path).unwrap();
    assert!(content.starts_with(b"durable\ntoo\n"));
    assert_eq!(logger.stats().persisted, 2);

    logger.log("later");
    logger.close().unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"durable\ntoo\nlater\n");
}

#[test]
fn flush_on_idle_logger_returns() {
    let dir = tempfile::tempdir().unwrap();
    let logger = Logger::open(dir.path().join("idle.log")).unwrap();
    logger.flush().unwrap();
    logger.flush().unwrap();
    assert_eq!(logger.stats().persisted, 0);
}

#[test]
fn concurrent_producers_never_corrupt_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mp.log");

    let logger = Arc::new(Logger::open(&path).unwrap());
    let threads = 4;
    let per_thread = 1_000;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..per_thread {
                    assert!(logger.log(format!("t{t}-{i:05}")).is_accepted());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let logger = Arc::try_unwrap(logger).unwrap();
    let stats = logger.close().unwrap();
    assert_eq!(stats.persisted, (threads * per_thread) as u64);

    let all = lines(&path);
    assert_eq!(all.len(), threads * per_thread);
    for t in 0..threads {
        let prefix = format!("t{t}-");
        let mine: Vec<usize> = all
            .iter()
            .filter(|l| l.starts_with(&prefix))
            .map(|l| l[prefix.len()..].parse().unwrap())
            .collect();
        assert_eq!(mine, (0..per_thread).collect::<Vec<_>>());
    }
}

#[test]
fn open_failure_surfaces_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Logger::open(dir.path().join("nope").join("x.log")).unwrap_err();
    assert!(matches!(err, LogError::Open { .. }));
}

#[test]
fn reports_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.log");
    let logger = Logger::builder().with_ring_size(4096).open(&path).unwrap();

    assert_eq!(logger.ring_size(), 4096);
    assert_eq!(logger.path(), path.as_path());
    assert!(format!("{logger:?}").contains("Logger"));
    logger.close().unwrap();
}

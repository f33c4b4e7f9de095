//! Polyq - Polymorphic MPMC Queue Demo
//!
//! Tiga pengukuran:
//! - Latency single-thread untuk event heterogen
//! - Throughput multi-producer ke satu konsumen
//! - Dua queue yang berbagi satu event threshold
//!
//! Usage: polyq [ITERATIONS]

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use polyq::{impl_upcast, BlockingEvent, Event, Monitor, QueueConfig, QueueError, SyncQueue};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_ITERATIONS: usize = 1_000_000;
const PRODUCERS: usize = 4;

/// Interface bersama untuk semua event market di demo.
trait MarketEvent {
    fn sequence(&self) -> u64;
    fn notional(&self) -> u64;
}

struct Trade {
    seq: u64,
    price: u64,
    qty: u64,
}

struct Quote {
    seq: u64,
    bid: u64,
    ask: u64,
    _venue: [u8; 24],
}

struct Heartbeat {
    seq: u64,
}

impl MarketEvent for Trade {
    fn sequence(&self) -> u64 {
        self.seq
    }

    fn notional(&self) -> u64 {
        self.price * self.qty
    }
}

impl MarketEvent for Quote {
    fn sequence(&self) -> u64 {
        self.seq
    }

    fn notional(&self) -> u64 {
        (self.bid + self.ask) / 2
    }
}

impl MarketEvent for Heartbeat {
    fn sequence(&self) -> u64 {
        self.seq
    }

    fn notional(&self) -> u64 {
        0
    }
}

impl_upcast!(dyn MarketEvent => Trade, Quote, Heartbeat);

type Queue = SyncQueue<dyn MarketEvent>;

fn main() -> Result<(), QueueError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("polyq=info")),
        )
        .init();

    let iterations = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_ITERATIONS);

    println!("🚀 Polyq - Polymorphic MPMC Queue");
    println!("==================================\n");

    benchmark_single_thread(iterations)?;
    benchmark_multi_producer(iterations)?;
    benchmark_shared_threshold(iterations / 10)?;

    println!("\n✅ All benchmarks complete!");
    Ok(())
}

/// Produce satu event sesuai urutan: trade, quote, heartbeat, ...
fn produce_mixed(queue: &Queue, seq: u64) {
    match seq % 3 {
        0 => queue.produce(Trade {
            seq,
            price: 100 + seq % 7,
            qty: 10,
        }),
        1 => queue.produce(Quote {
            seq,
            bid: 99,
            ask: 101,
            _venue: [0; 24],
        }),
        _ => queue.produce(Heartbeat { seq }),
    }
}

fn benchmark_single_thread(iterations: usize) -> Result<(), QueueError> {
    println!("📊 Single-Thread Latency (Heterogeneous Events)");
    println!("-----------------------------------------------");

    const BATCH: usize = 256;
    let queue: Queue = SyncQueue::with_config(
        QueueConfig::new(64 * 1024),
        Arc::new(Event::new(&Monitor::shared())),
        None,
    )?;

    // Warm up
    for i in 0..1000 {
        produce_mixed(&queue, i);
        queue.consume(|_| {});
    }

    // Benchmark produce + consume pair
    let mut checksum = 0u64;
    let start = Instant::now();
    for i in 0..iterations as u64 {
        produce_mixed(&queue, i);
        queue.consume(|event| checksum = checksum.wrapping_add(event.notional()));
    }
    let pair_duration = start.elapsed();

    // Benchmark batch produce, lalu drain
    let batches = (iterations / BATCH).max(1);
    let start = Instant::now();
    for b in 0..batches {
        for i in 0..BATCH {
            produce_mixed(&queue, (b * BATCH + i) as u64);
        }
        for _ in 0..BATCH {
            queue.consume(|event| checksum = checksum.wrapping_add(event.sequence()));
        }
    }
    let batch_duration = start.elapsed();

    let pair_ns = pair_duration.as_nanos() as f64 / iterations.max(1) as f64;
    let batch_ns = batch_duration.as_nanos() as f64 / (batches * BATCH) as f64;

    println!("  Operations: {}", iterations);
    println!(
        "  Produce+consume latency: {:.2} ns/op ({:.3} μs/op)",
        pair_ns,
        pair_ns / 1000.0
    );
    println!(
        "  Batched ({} per batch):  {:.2} ns/op",
        BATCH, batch_ns
    );
    println!("  Checksum: {}\n", checksum);

    Ok(())
}

fn benchmark_multi_producer(iterations: usize) -> Result<(), QueueError> {
    println!("📊 Multi-Producer Throughput ({} producers, 1 consumer)", PRODUCERS);
    println!("-------------------------------------------------------");

    let queue: Queue = SyncQueue::with_config(
        QueueConfig::new(256 * 1024),
        Arc::new(Event::new(&Monitor::shared())),
        None,
    )?;
    let per_producer = iterations / PRODUCERS;
    let mut consumed = 0usize;
    let mut retries = 0usize;

    let start = Instant::now();
    thread::scope(|s| {
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = &queue;
                s.spawn(move || {
                    let mut spins = 0usize;
                    for i in 0..per_producer {
                        let mut event = Trade {
                            seq: (p * per_producer + i) as u64,
                            price: 100,
                            qty: 1,
                        };
                        // Arena penuh: tunggu konsumen mengosongkan ruang
                        while let Err(rejected) = queue.try_produce(event) {
                            event = rejected;
                            spins += 1;
                            thread::yield_now();
                        }
                    }
                    spins
                })
            })
            .collect();

        let consumer = s.spawn(|| {
            let mut count = 0usize;
            while queue.consume(|_| {}) {
                count += 1;
            }
            count
        });

        for producer in producers {
            retries += producer
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        }
        queue.stop();
        consumed = consumer
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
    });
    let duration = start.elapsed();

    println!("  Produced: {}", per_producer * PRODUCERS);
    println!("  Consumed: {}", consumed);
    println!("  Full-arena retries: {}", retries);
    println!(
        "  Throughput: {:.2} M ops/sec\n",
        consumed as f64 / duration.as_secs_f64() / 1_000_000.0
    );

    Ok(())
}

fn benchmark_shared_threshold(iterations: usize) -> Result<(), QueueError> {
    println!("📊 Shared Threshold Event (2 queues, 1 additional event)");
    println!("--------------------------------------------------------");

    const LIMIT: usize = 8;
    let monitor = Monitor::shared();
    let additional = Arc::new(Event::new(&monitor));
    let config = QueueConfig::new(64 * 1024).with_additional_limit(LIMIT);

    let queues: [Queue; 2] = [
        SyncQueue::with_config(
            config.clone(),
            Arc::new(Event::new(&monitor)),
            Some(Arc::clone(&additional)),
        )?,
        SyncQueue::with_config(
            config,
            Arc::new(Event::new(&monitor)),
            Some(Arc::clone(&additional)),
        )?,
    ];

    let start = Instant::now();
    let consumed: Vec<usize> = thread::scope(|s| {
        let consumers: Vec<_> = queues
            .iter()
            .map(|queue| {
                s.spawn(move || {
                    let mut count = 0usize;
                    while queue.consume(|_| {}) {
                        count += 1;
                    }
                    count
                })
            })
            .collect();

        for i in 0..iterations {
            let queue = &queues[i % 2];
            let mut event = Heartbeat { seq: i as u64 };
            while let Err(rejected) = queue.try_produce(event) {
                event = rejected;
                thread::yield_now();
            }
        }
        for queue in &queues {
            queue.stop();
        }

        consumers
            .into_iter()
            .map(|consumer| {
                consumer
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    });
    let duration = start.elapsed();

    info!(
        signals = additional.generation(),
        "shared threshold run finished"
    );
    println!("  Threshold: {} entries", LIMIT);
    println!("  Consumed per queue: {:?}", consumed);
    println!("  Additional event signals: {}", additional.generation());
    println!("  Duration: {:.2} ms", duration.as_secs_f64() * 1000.0);

    Ok(())
}

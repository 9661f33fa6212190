//! Fee engine throughput benchmark - prices generated session histories
//!
//! Each trial builds one vehicle history of `--sessions` closed tickets with
//! random stays and gaps, then times `compute_continuous_fee` over it.

use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Parser;
use parking_facility::billing::{FeeEngine, RateSchedule};
use parking_facility::domain::session::ParkingSession;
use parking_facility::domain::types::{SlotSize, VehicleId};
use std::thread;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fee-bench")]
struct Args {
    /// Histories priced per thread
    #[arg(short, long, default_value = "2000")]
    trials: u32,
    /// Closed tickets per history
    #[arg(short, long, default_value = "32")]
    sessions: u32,
    /// Longest generated stay in minutes
    #[arg(long, default_value = "1800")]
    max_stay_min: u64,
    /// Longest generated gap between stays in minutes
    #[arg(long, default_value = "120")]
    max_gap_min: u64,
    #[arg(long, default_value = "4")]
    threads: u32,
    #[arg(long, default_value = "42")]
    seed: u64,
}

/// xorshift64*, enough to spread stays and gaps around the 1h boundary
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n.max(1)
    }
}

fn history(rng: &mut Rng, args: &Args, start: DateTime<Utc>) -> Vec<ParkingSession> {
    let vehicle = VehicleId::new("BENCH-1");
    let mut at = start;
    let mut out = Vec::with_capacity(args.sessions as usize);
    for _ in 0..args.sessions {
        let class = SlotSize::ALL[rng.below(3) as usize];
        let stay = Duration::seconds(rng.below(args.max_stay_min * 60) as i64);
        let session = ParkingSession::new(vehicle.clone(), class, at).closed_at(at + stay);
        match session {
            Ok(s) => out.push(s),
            Err(e) => eprintln!("skipping session: {e}"),
        }
        at = at + stay + Duration::seconds(rng.below(args.max_gap_min * 60) as i64);
    }
    out
}

fn run_thread(engine: FeeEngine, args: &Args, seed: u64) -> (Vec<u64>, u64) {
    let mut rng = Rng(seed | 1);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
    let mut latencies = Vec::with_capacity(args.trials as usize);
    let mut revenue = 0u64;

    for _ in 0..args.trials {
        let sessions = history(&mut rng, args, start);
        let t = Instant::now();
        match engine.compute_continuous_fee(&sessions) {
            Ok(fee) => revenue += fee,
            Err(e) => eprintln!("fee error: {e}"),
        }
        latencies.push(t.elapsed().as_nanos() as u64);
    }
    (latencies, revenue)
}

fn main() {
    let args = Args::parse();

    println!("Fee Engine Benchmark (Rust)");
    println!("===========================");
    println!("Threads: {}", args.threads);
    println!("Trials per thread: {}", args.trials);
    println!("Sessions per history: {}", args.sessions);
    println!("Stay <= {} min, gap <= {} min", args.max_stay_min, args.max_gap_min);
    println!();

    let engine = FeeEngine::new(RateSchedule::default());
    let wall = Instant::now();

    let results: Vec<(Vec<u64>, u64)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..args.threads.max(1))
            .map(|i| {
                let engine = engine.clone();
                let args = &args;
                scope.spawn(move || run_thread(engine, args, args.seed.wrapping_add(i as u64)))
            })
            .collect();
        handles.into_iter().filter_map(|h| h.join().ok()).collect()
    });

    let elapsed = wall.elapsed();
    let mut latencies: Vec<u64> = results.iter().flat_map(|(l, _)| l.iter().copied()).collect();
    let revenue: u64 = results.iter().map(|(_, r)| r).sum();

    println!("===========================");
    println!("Results:");
    if latencies.is_empty() {
        println!("  No histories priced!");
        return;
    }

    latencies.sort_unstable();
    let n = latencies.len();
    let sum: u64 = latencies.iter().sum();
    let p = |q: f64| latencies[((n as f64 * q) as usize).min(n - 1)];

    println!("  Histories: {}", n);
    println!("  Throughput: {:.0} histories/s", n as f64 / elapsed.as_secs_f64());
    println!("  Min: {} ns", latencies[0]);
    println!("  Avg: {} ns", sum / n as u64);
    println!("  P50: {} ns", p(0.50));
    println!("  P99: {} ns", p(0.99));
    println!("  Max: {} ns", latencies[n - 1]);
    println!("  Revenue checksum: {}", revenue);
}

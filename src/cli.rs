//! Subcommand implementations and shared CLI plumbing (argument parsing,
//! rayon pool configuration, exit codes).

use anyhow::{Context, Result};
use bitprune::bitvec::BitVec;
use bitprune::error::SearchError;
use bitprune::{checkpoint, keygen, search_crt, search_pq};
use clap::{Parser, Subcommand};
use rug::rand::RandState;
use rug::Integer;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "bitprune",
    about = "Bit-level branch-and-prune factorization of RSA moduli from partial key material"
)]
pub struct Cli {
    /// Number of rayon worker threads (defaults to all logical cores)
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Path to checkpoint file for resuming a `crt` kp sweep
    #[arg(long, global = true, default_value = "bitprune.checkpoint")]
    pub checkpoint: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recover (p, q) from N and partial known bits of p and q
    Pq {
        /// The RSA modulus N, decimal
        #[arg(long)]
        n: String,
        /// Known bits of p, MSB-first, '?' for unknown
        #[arg(long)]
        known_p: String,
        /// Known bits of q, MSB-first, '?' for unknown
        #[arg(long)]
        known_q: String,
    },
    /// Recover (p, q, dp, dq) from N, e, and partial known bits of dp and dq
    Crt {
        /// The RSA modulus N, decimal
        #[arg(long)]
        n: String,
        /// The public exponent e, decimal
        #[arg(long)]
        e: String,
        /// Known bits of dp, MSB-first, '?' for unknown
        #[arg(long)]
        known_dp: String,
        /// Known bits of dq, MSB-first, '?' for unknown
        #[arg(long)]
        known_dq: String,
        /// Resume the kp sweep from a previous checkpoint, if present
        #[arg(long)]
        resume: bool,
    },
    /// Run a few small worked examples showing both engines end to end
    Demo,
    /// Generate a random keypair of the given size, erase bits, and time the search
    Bench {
        /// Bit length of each prime factor
        #[arg(long, default_value_t = 24)]
        bits: u32,
        /// Fraction of bits revealed (0.0-1.0); the rest are erased
        #[arg(long, default_value_t = 0.3)]
        reveal_rate: f64,
        /// Public exponent, used only by `--crt`
        #[arg(long, default_value_t = 65537)]
        e: u64,
        /// Benchmark the CRT engine instead of the plain (p, q) engine
        #[arg(long)]
        crt: bool,
    },
}

/// Marks the two failure modes `main` maps to distinct exit codes: 1 for
/// `NoSolution`, 2 for malformed input. Any other error (I/O, checkpoint
/// corruption) falls through to anyhow's default and also exits 2.
#[derive(Debug)]
pub enum CliError {
    NoSolution,
    Malformed,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NoSolution => write!(f, "no solution"),
            CliError::Malformed => write!(f, "malformed input"),
        }
    }
}

impl std::error::Error for CliError {}

pub fn configure_rayon(threads: Option<usize>) {
    let num_threads = threads.unwrap_or(0);
    if let Err(err) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        tracing::warn!(%err, "rayon global pool already initialized, using default");
    }
}

fn parse_integer(label: &str, s: &str) -> Result<Integer> {
    Integer::from_str(s)
        .map_err(|_| anyhow::Error::new(CliError::Malformed))
        .with_context(|| format!("{label} is not a valid integer: {s:?}"))
}

fn parse_bits(label: &str, s: &str) -> Result<BitVec> {
    BitVec::parse_msb_first(s)
        .map_err(|err| anyhow::Error::new(CliError::Malformed).context(err))
        .with_context(|| format!("{label} is not a valid bit pattern: {s:?}"))
}

/// Dispatch a parsed `Cli` to the matching subcommand. Returns `Ok(())` on
/// success; `Err` carries a `CliError` that `main` downcasts to pick an
/// exit code (1 for `NoSolution`, 2 for everything else).
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Pq { n, known_p, known_q } => run_pq(&n, &known_p, &known_q),
        Commands::Crt {
            n,
            e,
            known_dp,
            known_dq,
            resume,
        } => run_crt(&n, &e, &known_dp, &known_dq, &cli.checkpoint, resume),
        Commands::Demo => run_demo(),
        Commands::Bench {
            bits,
            reveal_rate,
            e,
            crt,
        } => run_bench(bits, reveal_rate, e, crt),
    }
}

fn run_pq(n: &str, known_p: &str, known_q: &str) -> Result<()> {
    let n = parse_integer("N", n)?;
    let known_p = parse_bits("known_p", known_p)?;
    let known_q = parse_bits("known_q", known_q)?;

    match search_pq::first_solution(&n, &known_p, &known_q) {
        Ok((p, q)) => {
            println!("p = {p}");
            println!("q = {q}");
            Ok(())
        }
        Err(SearchError::NoSolution) => Err(anyhow::Error::new(CliError::NoSolution)
            .context("no (p, q) consistent with N and the given known bits")),
        Err(err) => Err(err.into()),
    }
}

fn run_crt(n: &str, e: &str, known_dp: &str, known_dq: &str, checkpoint_path: &PathBuf, resume: bool) -> Result<()> {
    let n = parse_integer("N", n)?;
    let e = parse_integer("e", e)?;
    let known_dp = parse_bits("known_dp", known_dp)?;
    let known_dq = parse_bits("known_dq", known_dq)?;

    let e_u = e.to_u64().context("e must fit in a u64 for the kp sweep")?;

    let start_kp = if resume {
        checkpoint::load(checkpoint_path)
            .filter(|cp| cp.n == n.to_string() && cp.e == e_u)
            .map(|cp| cp.next_kp)
            .unwrap_or(1)
    } else {
        1
    };

    let save_lock = std::sync::Mutex::new(());
    let checkpoint_sink = |next_kp: u64| {
        let _guard = save_lock.lock().unwrap();
        let _ = checkpoint::save(
            checkpoint_path,
            &checkpoint::Checkpoint {
                n: n.to_string(),
                e: e_u,
                next_kp,
            },
        );
    };

    let result = search_crt::branch_and_prune_crt_from(
        &n,
        &e,
        &known_dp,
        &known_dq,
        start_kp,
        Some(&checkpoint_sink),
    );

    let _ = checkpoint::save(
        checkpoint_path,
        &checkpoint::Checkpoint {
            n: n.to_string(),
            e: e_u,
            next_kp: e_u,
        },
    );

    match result {
        Some((p, q, dp, dq, kp, kq)) => {
            println!("p = {p}");
            println!("q = {q}");
            println!("dp = {dp}");
            println!("dq = {dq}");
            info!(%kp, %kq, "recovered via kp/kq");
            Ok(())
        }
        None => Err(anyhow::Error::new(CliError::NoSolution)
            .context("no (p, q, dp, dq) consistent with N, e, and the given known bits")),
    }
}

fn run_demo() -> Result<()> {
    println!("toy BP-PQ: N=899, partial p/q");
    let n = Integer::from(899);
    let known_p = BitVec::parse_msb_first("?11?1")?;
    let known_q = BitVec::parse_msb_first("?1?0?")?;
    let solutions = search_pq::branch_and_prune(&n, &known_p, &known_q);
    for (p, q) in &solutions {
        println!("  p = {p}, q = {q}");
    }

    println!("larger BP-PQ: N=2053351, partial p/q");
    let n = Integer::from(2_053_351);
    let known_p = BitVec::parse_msb_first("1?11??0??1")?;
    let known_q = BitVec::parse_msb_first("11?11?0??1?")?;
    let solutions = search_pq::branch_and_prune(&n, &known_p, &known_q);
    for (p, q) in &solutions {
        println!("  p = {p}, q = {q}");
    }

    println!("BP-CRT: N=899, e=17, partial dp/dq");
    let n = Integer::from(899);
    let e = Integer::from(17);
    let known_dp = BitVec::parse_msb_first("?0??1")?;
    let known_dq = BitVec::parse_msb_first("???0?")?;
    if let Some((p, q, dp, dq, kp, kq)) = search_crt::branch_and_prune_crt(&n, &e, &known_dp, &known_dq) {
        println!("  p = {p}, q = {q}, dp = {dp}, dq = {dq}, kp = {kp}, kq = {kq}");
    } else {
        println!("  no solution found");
    }

    Ok(())
}

fn run_bench(bits: u32, reveal_rate: f64, e: u64, crt: bool) -> Result<()> {
    let mut rng = RandState::new();
    if crt {
        let (n, e, known_dp, known_dq, ..) = keygen::example_crt(bits, reveal_rate, &Integer::from(e), &mut rng);
        let start = Instant::now();
        let result = search_crt::branch_and_prune_crt(&n, &e, &known_dp, &known_dq);
        let elapsed = start.elapsed();
        println!("CRT search over {bits}-bit primes, reveal_rate={reveal_rate}: {elapsed:?}");
        println!("  found: {}", result.is_some());
    } else {
        let (n, known_p, known_q, ..) = keygen::example_pq(bits, reveal_rate, &mut rng);
        let start = Instant::now();
        let solutions = search_pq::branch_and_prune(&n, &known_p, &known_q);
        let elapsed = start.elapsed();
        println!("PQ search over {bits}-bit primes, reveal_rate={reveal_rate}: {elapsed:?}");
        println!("  solutions: {}", solutions.len());
    }
    Ok(())
}

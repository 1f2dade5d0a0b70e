//! BP-CRT: branch-and-prune search for `(p, q, dp, dq)` given partial bit
//! patterns of the CRT exponents, plus the driver's `kp` sweep.
//!
//! Unlike BP-PQ, `p`/`q` carry no known bits here — every bit position
//! tries all four `(p[i], q[i])` combinations, gated by the coupling
//! congruences to `dp`/`dq` and the product congruence to `N`. The engine
//! always uses this enumerate-and-test form; it never depends on
//! `modular::p_from_dp`'s direct formula being defined.

use crate::bitvec::{pad_pair, BitVec, Trit};
use crate::modular::find_kq_from_kp;
use crate::progress::Progress;
use rayon::prelude::*;
use rug::Integer;
use std::sync::atomic::Ordering;
use tracing::{debug, info};

struct SearchNode {
    p: BitVec,
    q: BitVec,
    dp: BitVec,
    dq: BitVec,
    i: usize,
}

fn candidates(known: Trit) -> &'static [Trit] {
    match known {
        Trit::Zero => &[Trit::Zero],
        Trit::One => &[Trit::One],
        Trit::Unknown => &[Trit::Zero, Trit::One],
    }
}

const BOTH: [Trit; 2] = [Trit::Zero, Trit::One];

/// `(val * k) mod 2^(i+1) == (e*d - 1 + k) mod 2^(i+1)` — the coupling bit
/// check shared by `dp`/`p` and `dq`/`q`.
fn coupling_holds(val: &Integer, k: &Integer, e: &Integer, d: &Integer, i: usize) -> bool {
    let modulus = Integer::from(1) << (i as u32 + 1);
    let lhs = Integer::from(val * k).rem_euc(&modulus);
    let rhs = Integer::from(Integer::from(e * d) - 1 + k).rem_euc(&modulus);
    lhs == rhs
}

fn product_holds(p: &Integer, q: &Integer, i: usize, n: &Integer) -> bool {
    crate::prune::is_valid(p, q, i, n)
}

/// Run the CRT search for one fixed `(kp, kq)` pair. Returns every terminal
/// assignment that passes post-verification: `p*q == N`,
/// `e*dp ≡ 1 (mod p-1)`, `e*dq ≡ 1 (mod q-1)`.
pub fn search_with_kp(
    n: &Integer,
    e: &Integer,
    kp: &Integer,
    kq: &Integer,
    known_dp: &BitVec,
    known_dq: &BitVec,
) -> Vec<(Integer, Integer, Integer, Integer)> {
    let (known_dp, known_dq) = pad_pair(known_dp, known_dq);
    let l = known_dp.len();

    let mut solutions = Vec::new();
    let mut stack = vec![SearchNode {
        p: BitVec::new_zeros(l),
        q: BitVec::new_zeros(l),
        dp: BitVec::new_zeros(l),
        dq: BitVec::new_zeros(l),
        i: 0,
    }];

    while let Some(node) = stack.pop() {
        if node.i == l {
            let p = node.p.to_int().expect("terminal bits are fully determined");
            let q = node.q.to_int().expect("terminal bits are fully determined");
            let dp = node.dp.to_int().expect("terminal bits are fully determined");
            let dq = node.dq.to_int().expect("terminal bits are fully determined");
            if terminal_holds(&p, &q, &dp, &dq, n, e) {
                solutions.push((p, q, dp, dq));
            }
            continue;
        }

        for &bdp in candidates(known_dp.get(node.i)) {
            for &bdq in candidates(known_dq.get(node.i)) {
                let dp_next = node.dp.set(node.i, bdp);
                let dq_next = node.dq.set(node.i, bdq);
                for &bp in &BOTH {
                    for &bq in &BOTH {
                        let p_next = node.p.set(node.i, bp);
                        let q_next = node.q.set(node.i, bq);

                        let p_int = p_next.to_int().expect("fully determined up to i");
                        let q_int = q_next.to_int().expect("fully determined up to i");
                        let dp_int = dp_next.to_int().expect("fully determined up to i");
                        let dq_int = dq_next.to_int().expect("fully determined up to i");

                        let accepted = coupling_holds(&p_int, kp, e, &dp_int, node.i)
                            && coupling_holds(&q_int, kq, e, &dq_int, node.i)
                            && product_holds(&p_int, &q_int, node.i, n);

                        if accepted {
                            stack.push(SearchNode {
                                p: p_next.clone(),
                                q: q_next.clone(),
                                dp: dp_next.clone(),
                                dq: dq_next.clone(),
                                i: node.i + 1,
                            });
                        }
                    }
                }
            }
        }
    }

    solutions
}

fn terminal_holds(p: &Integer, q: &Integer, dp: &Integer, dq: &Integer, n: &Integer, e: &Integer) -> bool {
    if *p <= 1 || *q <= 1 {
        return false;
    }
    if Integer::from(p * q) != *n {
        return false;
    }
    let p_minus_1 = Integer::from(p - 1);
    let q_minus_1 = Integer::from(q - 1);
    Integer::from(e * dp).rem_euc(&p_minus_1) == 1 && Integer::from(e * dq).rem_euc(&q_minus_1) == 1
}

/// How many `kp` candidates to dispatch between checkpoint saves.
const CHECKPOINT_INTERVAL: u64 = 64;

/// Sweep `kp ∈ [1, e)`, deriving `kq` for each and running `search_with_kp`.
/// Returns the first candidate whose search yields a post-verified solution.
///
/// The sweep runs on rayon's pool — the `kp` loop is embarrassingly
/// parallel — but `find_map_first` preserves the deterministic "lowest `kp`
/// wins" semantics of a sequential sweep, even though the search work for
/// multiple `kp` candidates overlaps in time.
pub fn branch_and_prune_crt(
    n: &Integer,
    e: &Integer,
    known_dp: &BitVec,
    known_dq: &BitVec,
) -> Option<(Integer, Integer, Integer, Integer, Integer, Integer)> {
    branch_and_prune_crt_from(n, e, known_dp, known_dq, 1, None)
}

/// Same as `branch_and_prune_crt`, but starting the sweep at `start_kp`
/// instead of 1, and optionally calling `checkpoint_sink` with the lowest
/// `kp` dispatched so far every [`CHECKPOINT_INTERVAL`] candidates — the
/// resumable form the CLI's `crt --resume` path uses. `checkpoint_sink` is
/// called from whichever rayon worker happens to cross the interval
/// boundary, so it must tolerate being invoked from any thread and more
/// than once with the same or a lower value.
pub fn branch_and_prune_crt_from(
    n: &Integer,
    e: &Integer,
    known_dp: &BitVec,
    known_dq: &BitVec,
    start_kp: u64,
    checkpoint_sink: Option<&(dyn Fn(u64) + Sync)>,
) -> Option<(Integer, Integer, Integer, Integer, Integer, Integer)> {
    let e_u = e.to_u64().expect("e must fit in u64 for the kp sweep");
    debug!(e = e_u, start_kp, "starting BP-CRT kp sweep");

    let progress = Progress::new();
    let _reporter = progress.start_reporter();

    let result = (start_kp.max(1)..e_u).into_par_iter().find_map_first(|kp_val| {
        let expanded = progress.nodes_expanded.fetch_add(1, Ordering::Relaxed) + 1;
        progress.low_water_mark.fetch_min(kp_val, Ordering::Relaxed);
        *progress.current.lock().unwrap() = format!("kp={kp_val}");

        if let Some(sink) = checkpoint_sink {
            if expanded % CHECKPOINT_INTERVAL == 0 {
                sink(progress.low_water_mark.load(Ordering::Relaxed));
            }
        }

        let kp = Integer::from(kp_val);
        let kq = find_kq_from_kp(&kp, n, e)?;
        search_with_kp(n, e, &kp, &kq, known_dp, known_dq)
            .into_iter()
            .next()
            .map(|(p, q, dp, dq)| (p, q, dp, dq, kp, kq))
    });

    if result.is_some() {
        progress.solutions_found.fetch_add(1, Ordering::Relaxed);
    }
    progress.stop();

    info!(found = result.is_some(), "BP-CRT kp sweep complete");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// N=899, e=17, partial dp/dq.
    #[test]
    fn toy_crt_example_recovers_known_factorization() {
        let n = Integer::from(899);
        let e = Integer::from(17);
        let known_dp = BitVec::parse_msb_first("?0??1").unwrap();
        let known_dq = BitVec::parse_msb_first("???0?").unwrap();

        let (p, q, dp, dq, _kp, _kq) = branch_and_prune_crt(&n, &e, &known_dp, &known_dq)
            .expect("must find a solution");

        assert_eq!(Integer::from(&p * &q), n);
        let p_minus_1 = Integer::from(&p - 1);
        let q_minus_1 = Integer::from(&q - 1);
        assert_eq!(Integer::from(&e * &dp).rem_euc(&p_minus_1), 1);
        assert_eq!(Integer::from(&e * &dq).rem_euc(&q_minus_1), 1);
    }

    /// Verifies at least one `kp` in `[1, e)` yields a post-verified
    /// solution, and that candidates with a non-invertible left-hand
    /// coefficient are skipped rather than panicking.
    ///
    /// N = 899 = 29*31, e = 13: dp = 13^-1 mod 28 = 13, dq = 13^-1 mod 30 = 7
    /// (so the true kp = (e*dp-1)/(p-1) = 6). Several other kp in [1,13)
    /// fail `find_kq_from_kp`'s invertibility check and are silently skipped.
    #[test]
    fn kp_sweep_finds_solution_and_skips_bad_candidates() {
        let n = Integer::from(899);
        let e = Integer::from(13);
        let known_dp = BitVec::parse_msb_first("01101").unwrap(); // 13
        let known_dq = BitVec::parse_msb_first("00111").unwrap(); // 7

        let result = branch_and_prune_crt(&n, &e, &known_dp, &known_dq);
        let (p, q, dp, dq, kp, kq) = result.expect("kp sweep must find a solution");

        assert_eq!(Integer::from(&p * &q), n);
        assert_eq!(dp, 13);
        assert_eq!(dq, 7);
        assert!(kp >= 1 && kp < e);
        assert!(kq >= 1 && kq < e);
    }

    /// N=899, e=97, dp=dq=31 (fixed, wrong for any factor pair of 899) — no
    /// `kp` in `[1, 97)` yields a solution, so the sweep must exhaust every
    /// candidate. With `CHECKPOINT_INTERVAL` = 64 and 96 candidates, the
    /// sink fires exactly once, carrying a `kp` somewhere in range.
    #[test]
    fn checkpoint_sink_fires_once_over_a_sweep_longer_than_the_interval() {
        let n = Integer::from(899);
        let e = Integer::from(97);
        let known_dp = BitVec::parse_msb_first("11111").unwrap();
        let known_dq = BitVec::parse_msb_first("11111").unwrap();

        let calls = std::sync::Mutex::new(Vec::new());
        let sink = |low_water_mark: u64| calls.lock().unwrap().push(low_water_mark);

        let result = branch_and_prune_crt_from(&n, &e, &known_dp, &known_dq, 1, Some(&sink));

        assert!(result.is_none());
        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0] >= 1 && calls[0] < 97);
    }
}

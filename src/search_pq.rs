//! BP-PQ: depth-first branch-and-prune search for `(p, q)` given partial
//! bit patterns.
//!
//! The stack is explicit (`Vec<SearchNode>`), not recursion — depth equals
//! the bit length `L`, which can run to thousands for realistic RSA moduli.
//! Positions `>= i` in a node's `p`/`q` are left at `Trit::Zero`
//! placeholders; only `[0, i)` is meaningful.

use crate::bitvec::{pad_pair, BitVec, Trit};
use crate::error::SearchError;
use crate::prune::is_valid_bits;
use rug::Integer;
use tracing::{debug, info};

struct SearchNode {
    p: BitVec,
    q: BitVec,
    i: usize,
}

/// The 1 or 2 bit values consistent with a known-bit entry at one position.
fn candidates(known: Trit) -> &'static [Trit] {
    match known {
        Trit::Zero => &[Trit::Zero],
        Trit::One => &[Trit::One],
        Trit::Unknown => &[Trit::Zero, Trit::One],
    }
}

/// Enumerate every `(p, q)` consistent with `N` and the known bits of `p`
/// and `q`. Returns all solutions in the deterministic order the LIFO stack
/// discharges them in.
///
/// `known_p`/`known_q` are MSB-first-parsed, internally LSB-first `BitVec`s
/// of possibly unequal length — they are zero-padded to a common length
/// here.
pub fn branch_and_prune(n: &Integer, known_p: &BitVec, known_q: &BitVec) -> Vec<(Integer, Integer)> {
    let (known_p, known_q) = pad_pair(known_p, known_q);
    let l = known_p.len();
    debug!(bit_length = l, "starting BP-PQ search");

    let mut solutions = Vec::new();
    let mut stack = vec![SearchNode {
        p: BitVec::new_zeros(l),
        q: BitVec::new_zeros(l),
        i: 0,
    }];
    let mut nodes_expanded: u64 = 0;

    while let Some(node) = stack.pop() {
        if node.i == l {
            // Always re-verify the terminal, even though every accepted
            // branch already passed the congruence check at each depth.
            let p_int = node.p.to_int().expect("terminal node bits are fully determined");
            let q_int = node.q.to_int().expect("terminal node bits are fully determined");
            if Integer::from(&p_int * &q_int) == *n {
                solutions.push((p_int, q_int));
            }
            continue;
        }

        nodes_expanded += 1;
        for &bp in candidates(known_p.get(node.i)) {
            for &bq in candidates(known_q.get(node.i)) {
                let p_next = node.p.set(node.i, bp);
                let q_next = node.q.set(node.i, bq);
                if is_valid_bits(&p_next, &q_next, node.i, n) {
                    stack.push(SearchNode {
                        p: p_next,
                        q: q_next,
                        i: node.i + 1,
                    });
                }
            }
        }
    }

    info!(
        nodes_expanded,
        solutions = solutions.len(),
        "BP-PQ search complete"
    );
    solutions
}

/// The first solution `branch_and_prune` finds, or `NoSolution` if the
/// search exhausted without a verified terminal.
pub fn first_solution(
    n: &Integer,
    known_p: &BitVec,
    known_q: &BitVec,
) -> Result<(Integer, Integer), SearchError> {
    branch_and_prune(n, known_p, known_q)
        .into_iter()
        .next()
        .ok_or(SearchError::NoSolution)
}

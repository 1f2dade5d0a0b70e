//! The congruence-based pruning predicate shared by both search engines.

use crate::bitvec::BitVec;
use rug::Integer;

/// `is_valid(p, q, i, N)`: true iff `p*q ≡ N (mod 2^(i+1))`.
///
/// `p` and `q` must be fully determined in `[0, i]` — positions above `i`
/// are treated as 0 by `BitVec::to_int`'s LSB-first convention only if the
/// caller has not yet written them, which the search engines guarantee by
/// construction (they write positions `<= i` only).
///
/// The modulus is `2^(i+1)`, not `2^i`: after deciding bit `i`, the lowest
/// `i+1` bits of the product must already match `N`.
pub fn is_valid(p: &Integer, q: &Integer, i: usize, n: &Integer) -> bool {
    let modulus = Integer::from(1) << (i as u32 + 1);
    Integer::from(p * q).rem_euc(&modulus) == Integer::from(n).rem_euc(&modulus)
}

/// Convenience wrapper taking `BitVec`s directly, for callers that haven't
/// already converted to `Integer`. Panics if either vector has an unknown
/// bit in `[0, i]` — that would mean the engine wrote past its own
/// invariant.
pub fn is_valid_bits(p: &BitVec, q: &BitVec, i: usize, n: &Integer) -> bool {
    let p_int = p.to_int().expect("p must be fully determined to call is_valid");
    let q_int = q.to_int().expect("q must be fully determined to call is_valid");
    is_valid(&p_int, &q_int, i, n)
}

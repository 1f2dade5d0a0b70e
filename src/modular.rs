//! Modular arithmetic helpers underpinning both search engines: gcd, modular
//! inverse via the extended Euclidean algorithm, and the `kp`/`kq` coupling
//! used to derive CRT exponent candidates.

use rug::Integer;

/// Nonnegative Euclidean GCD.
pub fn gcd(a: &Integer, b: &Integer) -> Integer {
    let mut a = a.clone().abs();
    let mut b = b.clone().abs();
    while b != 0 {
        let r = Integer::from(&a % &b);
        a = b;
        b = r;
    }
    a
}

/// The modular inverse of `a` mod `m` via the extended Euclidean algorithm.
/// Returns `None` if `gcd(a, m) != 1`; callers skip the branch or candidate
/// rather than treat this as an error.
pub fn mod_inverse(a: &Integer, m: &Integer) -> Option<Integer> {
    if *m <= 1 {
        return None;
    }
    let (mut old_r, mut r) = (a.clone().rem_euc(m), m.clone());
    let (mut old_s, mut s) = (Integer::from(1), Integer::from(0));

    while r != 0 {
        let q = Integer::from(&old_r / &r);
        let new_r = Integer::from(&old_r - Integer::from(&q * &r));
        old_r = r;
        r = new_r;
        let new_s = Integer::from(&old_s - Integer::from(&q * &s));
        old_s = s;
        s = new_s;
    }

    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euc(m))
}

/// Derive `kq` from a candidate `kp`:
///
/// `(kp - 1 - kp*N) * kq ≡ (kp - 1) (mod e)`
///
/// Returns `None` if the left-hand coefficient has no inverse mod `e`.
pub fn find_kq_from_kp(kp: &Integer, n: &Integer, e: &Integer) -> Option<Integer> {
    let lhs = Integer::from(kp - 1 - Integer::from(kp * n)).rem_euc(e);
    let rhs = Integer::from(kp - 1).rem_euc(e);
    let lhs_inv = mod_inverse(&lhs, e)?;
    Some(Integer::from(&rhs * &lhs_inv).rem_euc(e))
}

/// Sanity check: `(kp-1)(kq-1) ≡ kp*kq*N (mod e)`.
pub fn check_kq(kp: &Integer, kq: &Integer, n: &Integer, e: &Integer) -> bool {
    let lhs = Integer::from((kp - 1) * (kq - 1)).rem_euc(e);
    let rhs = Integer::from(Integer::from(kp * kq) * n).rem_euc(e);
    lhs == rhs
}

/// `p ≡ (kp^-1 mod 2^(i+1)) * (e*dp - 1 + kp) (mod 2^(i+1))`, a direct
/// formula usable only when `kp` is odd. Returns `None` when `kp` has no
/// inverse mod `2^(i+1)` (i.e. `kp` is even) — the search engine never
/// depends on this succeeding; `search_crt` always falls back to
/// enumerate-and-test instead.
pub fn p_from_dp(dp: &Integer, kp: &Integer, e: &Integer, i: u32) -> Option<Integer> {
    let modulus = Integer::from(1) << (i + 1);
    let rhs = Integer::from(Integer::from(e * dp) - 1 + kp).rem_euc(&modulus);
    let kp_reduced = kp.clone().rem_euc(&modulus);
    let kp_inv = mod_inverse(&kp_reduced, &modulus)?;
    Some(Integer::from(&kp_inv * &rhs).rem_euc(&modulus))
}

//! RSA keypair generation and bit-erasure, for building worked examples and
//! exercising the search engines end to end.
//!
//! Primality goes through `rug::Integer::is_probably_prime`; erasure
//! produces `Trit::Unknown` rather than a sentinel value.

use crate::bitvec::{BitVec, Trit};
use crate::modular::{gcd, mod_inverse};
use rug::rand::RandState;
use rug::Integer;

/// A generated RSA keypair: `n = p*q`, public exponent `e`, CRT private
/// exponents `dp = d mod (p-1)`, `dq = d mod (q-1)`.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub n: Integer,
    pub e: Integer,
    pub p: Integer,
    pub q: Integer,
    pub d: Integer,
    pub dp: Integer,
    pub dq: Integer,
}

/// Generate a random odd `bits`-length prime via rejection sampling plus
/// GMP's Miller-Rabin.
fn generate_prime(bits: u32, rng: &mut RandState) -> Integer {
    loop {
        let mut candidate = Integer::from(Integer::random_bits(bits, rng));
        candidate.set_bit(0, true);
        candidate.set_bit(bits - 1, true);
        if candidate.is_probably_prime(30) != rug::integer::IsPrime::No {
            return candidate;
        }
    }
}

/// Generate an RSA keypair with `bits`-length primes and caller-supplied
/// public exponent `e`.
pub fn generate_keypair(bits: u32, e: &Integer, rng: &mut RandState) -> KeyPair {
    let p = generate_prime(bits, rng);
    let mut q = generate_prime(bits, rng);
    while q == p {
        q = generate_prime(bits, rng);
    }
    let n = Integer::from(&p * &q);
    let phi = Integer::from(&p - 1) * Integer::from(&q - 1);
    assert_eq!(
        gcd(e, &phi),
        1,
        "e must be coprime to phi(n) for a valid keypair"
    );
    let d = mod_inverse(e, &phi).expect("gcd(e, phi) == 1 guarantees an inverse");
    let dp = Integer::from(&d % Integer::from(&p - 1));
    let dq = Integer::from(&d % Integer::from(&q - 1));
    KeyPair {
        n,
        e: e.clone(),
        p,
        q,
        d,
        dp,
        dq,
    }
}

/// Erase each bit independently with probability `1 - reveal_rate`.
/// `reveal_rate` is clamped to `[0.0, 1.0]`.
pub fn erase_bits(full: &BitVec, reveal_rate: f64, rng: &mut RandState) -> BitVec {
    let reveal_rate = reveal_rate.clamp(0.0, 1.0);
    let mut bits = Vec::with_capacity(full.len());
    for i in 0..full.len() {
        let keep = (rng.bits(32) as f64 / u32::MAX as f64) < reveal_rate;
        bits.push(if keep { full.get(i) } else { Trit::Unknown });
    }
    let mut v = BitVec::new_zeros(bits.len());
    for (i, t) in bits.into_iter().enumerate() {
        v = v.set(i, t);
    }
    v
}

/// One worked BP-PQ example: `(N, known_p, known_q, p, q)`.
/// `known_p`/`known_q` have bits erased at `1 - reveal_rate`.
pub fn example_pq(bits: u32, reveal_rate: f64, rng: &mut RandState) -> (Integer, BitVec, BitVec, Integer, Integer) {
    let p = generate_prime(bits, rng);
    let mut q = generate_prime(bits, rng);
    while q == p {
        q = generate_prime(bits, rng);
    }
    let n = Integer::from(&p * &q);
    let len = p.significant_bits().max(q.significant_bits()) as usize;
    let p_bits = BitVec::from_int(&p, len);
    let q_bits = BitVec::from_int(&q, len);
    let known_p = erase_bits(&p_bits, reveal_rate, rng);
    let known_q = erase_bits(&q_bits, reveal_rate, rng);
    (n, known_p, known_q, p, q)
}

/// One worked BP-CRT example:
/// `(N, e, known_dp, known_dq, dp, dq, p, q)`.
///
/// Regenerates `p`/`q` until `e` is a valid exponent for the resulting
/// `phi(N)`.
#[allow(clippy::type_complexity)]
pub fn example_crt(
    bits: u32,
    reveal_rate: f64,
    e: &Integer,
    rng: &mut RandState,
) -> (Integer, Integer, BitVec, BitVec, Integer, Integer, Integer, Integer) {
    loop {
        let p = generate_prime(bits, rng);
        let mut q = generate_prime(bits, rng);
        while q == p {
            q = generate_prime(bits, rng);
        }
        let phi = Integer::from(&p - 1) * Integer::from(&q - 1);
        if *e >= phi || gcd(e, &phi) != 1 {
            continue;
        }
        let n = Integer::from(&p * &q);
        let d = mod_inverse(e, &phi).expect("gcd(e, phi) == 1 checked above");
        let dp = Integer::from(&d % Integer::from(&p - 1));
        let dq = Integer::from(&d % Integer::from(&q - 1));
        let len = n.significant_bits() as usize;
        let dp_bits = BitVec::from_int(&dp, len);
        let dq_bits = BitVec::from_int(&dq, len);
        let known_dp = erase_bits(&dp_bits, reveal_rate, rng);
        let known_dq = erase_bits(&dq_bits, reveal_rate, rng);
        return (n, e.clone(), known_dp, known_dq, dp, dq, p, q);
    }
}

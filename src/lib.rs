//! Bit-level branch-and-prune factorization of RSA moduli from partially
//! known private-key material (Heninger–Shacham).
//!
//! ## Module organization
//!
//! - [`bitvec`] — the `BitVec`/`Trit` primitive: fixed-length ternary bit
//!   vectors, LSB-first internally, MSB-first at the string boundary.
//! - [`modular`] — GCD, modular inverse, and the `kp`/`kq` coupling algebra.
//! - [`prune`] — the congruence-based pruning predicate shared by both
//!   search engines.
//! - [`search_pq`] — BP-PQ: recovers `(p, q)` from partial bits of each.
//! - [`search_crt`] — BP-CRT: recovers `(p, q, dp, dq)` from partial bits of
//!   the CRT exponents, plus the `kp` sweep that drives it.
//! - [`keygen`] — RSA keypair generation and bit erasure, for building
//!   worked examples.
//! - [`checkpoint`] — resumable state for the BP-CRT `kp` sweep.
//! - [`progress`] — atomic counters for the background progress reporter.
//! - [`error`] — the crate's error types.

pub mod bitvec;
pub mod checkpoint;
pub mod error;
pub mod keygen;
pub mod modular;
pub mod progress;
pub mod prune;
pub mod search_crt;
pub mod search_pq;

//! # Randomized-Math Program Generator
//!
//! Deterministically generates short integer ALU programs from a block
//! height. Candidate instructions are drawn from a hash-refreshed byte
//! stream and accepted against a pipeline-scheduling model of a real CPU
//! (3 ALUs, per-opcode latencies), then topped up against an idealized
//! parallel-ASIC latency model, so the resulting programs are uniformly
//! expensive across hardware classes.
//!
//! ## Example
//!
//! ```rust
//! use randmath_gen::generate;
//! use randmath_spec::Variant;
//!
//! let program = generate(1, Variant::Baseline);
//! assert!(program.validate(Variant::Baseline).is_ok());
//! ```
//!
//! Generation is pure and synchronous; each worker owns its own stream and
//! program. Programs are immutable once returned.

pub mod generator;
pub mod scheduler;
pub mod stream;

pub use generator::{generate, generate_with_hash};
pub use stream::{ByteStream, Sha256Refresh, StreamHash, STREAM_BUFFER_SIZE};

//! # Quantum-Chain Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── restriction_benchmarks.rs  # validate / apply / commit throughput
//! └── src/integration/
//!     ├── restriction_flows.rs       # block execution, reorgs, mirror
//!     └── policy_flows.rs            # dependent-transaction gating
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qc-tests
//! cargo test -p qc-tests integration::policy_flows
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

#![allow(dead_code)]

pub mod integration;

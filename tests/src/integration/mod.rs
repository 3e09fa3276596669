//! Cross-module flows through the public API of `qc-18-account-restrictions`.

pub mod policy_flows;
pub mod restriction_flows;

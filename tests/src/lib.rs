//! LiteSVM harness for the compiled stake program.
//!
//! The program binary comes from `anchor build` (`target/deploy/stake_program.so`).

pub mod common;

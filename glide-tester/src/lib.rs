//! Glide Tester
//!
//! Monte Carlo harness flying several policies over identical seeds and
//! reporting how far each one gets.

pub mod logic;

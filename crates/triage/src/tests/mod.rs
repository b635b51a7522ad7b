//! End-to-end engine scenarios.

mod scenarios;

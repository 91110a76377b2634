//! Cross-crate integration tests.
//!
//! This crate carries no production code of its own — see `tests/` for
//! scenarios that exercise two or more protocol crates together the way a
//! running node would, without going through the full node-wiring binary.

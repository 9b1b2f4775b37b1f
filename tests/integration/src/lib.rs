//! End-to-end tests for the amx authentication engine live under `tests/`.

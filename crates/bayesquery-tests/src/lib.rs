//! Test-only crate for cross-crate integration and property tests; see `tests/`.

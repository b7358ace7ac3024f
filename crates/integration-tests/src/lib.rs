//! End-to-end tests for the ranking engine over the real JSON store.
//! See the `tests/` directory; this crate exports nothing.

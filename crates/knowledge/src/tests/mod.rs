//! Cross-module retrieval tests.

mod retrieval;

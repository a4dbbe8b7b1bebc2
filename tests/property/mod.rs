//! Property-based tests for eligibility and diff guarantees

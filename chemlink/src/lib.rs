//! Expose chemlink's internal API for use in integration tests. It is not
//! meant as a stable interface; embed [`chemlink_filter`] directly instead.
pub mod cli;
pub mod pages;
pub mod scan;

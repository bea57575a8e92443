//! HTTP boundary for the pesca query service.
//!
//! The routes mirror the three query operations; everything else (store,
//! query construction, normalization) lives in `pesca-core` and
//! `pesca-warehouse`.

pub mod cli;
pub mod error;
pub mod routes;

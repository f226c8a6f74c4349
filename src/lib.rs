//! Patternbook turns hybrid documents (markdown prose interleaved with
//! pattern blocks) into a single page where every pattern block is replaced
//! by its rendered artifact.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;

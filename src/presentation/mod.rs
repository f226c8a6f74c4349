//! Page templates wrapping the assembled document body.

pub mod views;

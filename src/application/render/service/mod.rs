//! Concrete collaborators for the render pipeline: comrak for prose,
//! syntect for pattern code, and an external command for pattern artifacts.

mod cli;
mod config;
mod highlight;
mod markdown;

pub use cli::CliPatternRenderer;
pub use markdown::{ComrakMarkdown, rewrite_wiki_links};

pub(crate) use highlight::highlight_pattern_code;

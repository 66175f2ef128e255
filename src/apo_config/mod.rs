//! Equalizer APO `config.txt` handling.

pub mod directives;
pub mod merge;

pub use directives::{ChannelLayout, DirectiveBlock, DEFAULT_CONFIG_TEMPLATE};
pub use merge::{merge_block, MergeOutcome};

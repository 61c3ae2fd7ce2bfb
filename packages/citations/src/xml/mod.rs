//! XML access: DOM helpers for well-formed blocks and a depth-tracked
//! scanner for the raw document.

pub mod scanner;
mod utils;

pub use scanner::{scan, RawElement};
pub use utils::{
    attribute_is_true, child_text, collect_text, find_child, find_children, get_tag_name,
    SKIPPED_TEXT_TAGS,
};

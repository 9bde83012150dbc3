//! Reply text for chat users.
//!
//! This module provides builder patterns for passthrough and catalog replies
//! and a renderer that turns every `RconError` into one human-readable line.

mod builder;

pub use builder::{
    ListReplyBuilder, PassthroughReplyBuilder, TRUNCATION_MARKER, help_text, render_error,
    truncate_output,
};
pub(crate) use builder::{
    ADD_USAGE, DEL_USAGE, SEND_USAGE, USE_USAGE, added_reply, removed_reply, selected_reply,
};

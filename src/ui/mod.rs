//! Console presentation
//!
//! - [`select`] - inline multi-select prompt (ratatui)
//! - [`confirm`] - y/n prompt for confirmed actions
//! - [`progress`] - [`ProgressSink`](crate::operation::ProgressSink) printing one line per event
//! - [`table`] - aligned resource table for `list`

pub mod confirm;
pub mod progress;
pub mod select;
pub mod table;

use std::io::IsTerminal;

/// True when both stdin and stdout are terminals
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Colors are used on a terminal unless `NO_COLOR` is set
pub fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

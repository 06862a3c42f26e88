pub mod persist;
pub mod summary;
pub mod table;

use owo_colors::{OwoColorize, Stream, Style};
use std::fmt::Display;

/// Style `value` for stdout, honouring `--no-color` and non-terminal output.
pub fn paint(value: impl Display, style: Style) -> String {
    value
        .if_supports_color(Stream::Stdout, |v| v.style(style))
        .to_string()
}

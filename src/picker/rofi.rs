//! rofi (dmenu mode) driver.
//!
//! Lines are human readable, `name (desc)`, with an optional icon hint after
//! a NUL. `-format i` makes rofi print the selected line's position rather
//! than its text.

use super::{sanitize, PickerDriver};
use crate::core::Item;

/// Driver for `rofi -dmenu`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RofiDriver;

impl PickerDriver for RofiDriver {
    fn name(&self) -> &'static str {
        "rofi"
    }

    fn default_bin(&self) -> &'static str {
        "rofi"
    }

    fn flags(&self, palette: &str) -> Vec<String> {
        ["-dmenu", "-i", "-format", "i", "-p", palette, "-matching", "fuzzy", "-show-icons"]
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn format_line(&self, _index: usize, _palette: &str, item: &Item) -> String {
        let name = sanitize(&item.name());
        let mut line = match item.desc() {
            Some(desc) => format!("{name} ({})", sanitize(&desc)),
            None => name,
        };
        if let Some(icon) = item.icon() {
            line.push_str("\0icon\x1f");
            line.push_str(&sanitize(&icon));
        }
        line
    }

    fn parse_index(&self, stdout: &str) -> Option<usize> {
        stdout.trim().lines().next()?.trim().parse().ok()
    }
}

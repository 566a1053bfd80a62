//! fzf driver.
//!
//! Lines are `index \t [tag] \t name \t desc`. fzf shows and matches only
//! columns 2-4, and prints the whole line back, so the index is the first
//! tab-delimited field of the output.

use super::{sanitize, PickerDriver};
use crate::core::Item;

/// Driver for fzf and fzf-compatible finders.
#[derive(Debug, Clone, Copy, Default)]
pub struct FzfDriver;

impl PickerDriver for FzfDriver {
    fn name(&self) -> &'static str {
        "fzf"
    }

    fn default_bin(&self) -> &'static str {
        "fzf"
    }

    fn flags(&self, palette: &str) -> Vec<String> {
        vec![
            "--delimiter=\t".to_string(),
            "--with-nth=2,3,4".to_string(),
            "--nth=2,3,4".to_string(),
            "--prompt".to_string(),
            format!("{palette}> "),
        ]
    }

    fn format_line(&self, index: usize, palette: &str, item: &Item) -> String {
        let tag = item.palette_tag().unwrap_or(palette);
        format!(
            "{index}\t[{}]\t{}\t{}",
            sanitize(tag),
            sanitize(&item.name()),
            sanitize(&item.desc().unwrap_or_default())
        )
    }

    fn parse_index(&self, stdout: &str) -> Option<usize> {
        let line = stdout.trim_start_matches(['\r', '\n']).lines().next()?;
        line.split('\t').next()?.trim().parse().ok()
    }
}

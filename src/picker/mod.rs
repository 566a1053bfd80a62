//! Picker drivers.
//!
//! A picker is an external interactive program (fzf, rofi) that reads one
//! candidate per line on stdin and reports the chosen one on stdout. Each
//! driver knows how to encode items as lines, which flags make the picker
//! match only on the visible columns, and how to read the selected index
//! back.
//!
//! Selection is always by position: the index the picker returns points
//! into the normalized item list that produced the input lines.

mod fzf;
mod rofi;

pub use fzf::FzfDriver;
pub use rofi::RofiDriver;

use serde_json::Value;

use crate::core::{
    expand_path, Config, Executor, Invocation, Item, PalError, PalResult, PickerConfig,
};

/// Encoding and flags for one picker protocol.
pub trait PickerDriver: Send + Sync {
    /// Driver name as used in configuration.
    fn name(&self) -> &'static str;

    /// Binary run when the picker config names none.
    fn default_bin(&self) -> &'static str;

    /// Fixed flags placed between the binary and the user's extra args.
    fn flags(&self, palette: &str) -> Vec<String>;

    /// Encode one item as a single input line.
    fn format_line(&self, index: usize, palette: &str, item: &Item) -> String;

    /// Read the selected index from the picker's stdout.
    fn parse_index(&self, stdout: &str) -> Option<usize>;
}

static FZF: FzfDriver = FzfDriver;
static ROFI: RofiDriver = RofiDriver;

/// Look up a driver by name.
pub fn driver(name: &str) -> Option<&'static dyn PickerDriver> {
    match name {
        "fzf" => Some(&FZF),
        "rofi" => Some(&ROFI),
        _ => None,
    }
}

/// A picker invocation together with the items its lines were built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    /// Argument vector and stdin text
    pub invocation: Invocation,

    /// Well-formed items; line `i` of the input encodes `items[i]`
    pub items: Vec<Item>,
}

/// Spawns a picker process.
pub trait PickerProcess {
    /// Run the invocation and return its stdout, or `None` if it exited
    /// non-zero (the user closed the picker).
    fn spawn(&self, invocation: &Invocation) -> PalResult<Option<String>>;
}

/// Runs pickers as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcess;

impl PickerProcess for SystemProcess {
    fn spawn(&self, invocation: &Invocation) -> PalResult<Option<String>> {
        let (program, args) = invocation
            .cmd
            .split_first()
            .ok_or_else(|| PalError::Picker("empty picker command".to_string()))?;

        tracing::debug!(
            program = %program,
            lines = invocation.input.lines().count(),
            "Spawning picker"
        );
        let result = Executor::new()
            .capture_stdout(true)
            .input(invocation.input.clone())
            .run(program, args)
            .map_err(|e| PalError::Picker(format!("failed to run {program}: {e}")))?;

        if !result.success() {
            tracing::debug!(code = ?result.code(), "Picker closed without a selection");
            return Ok(None);
        }
        Ok(result.stdout)
    }
}

/// A configured picker.
#[derive(Clone)]
pub struct Picker {
    name: String,
    driver: &'static dyn PickerDriver,
    config: PickerConfig,
}

impl std::fmt::Debug for Picker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Picker")
            .field("name", &self.name)
            .field("driver", &self.driver.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Picker {
    /// Create a picker from a driver and its settings.
    pub fn new(
        name: impl Into<String>,
        driver: &'static dyn PickerDriver,
        config: PickerConfig,
    ) -> Self {
        Self { name: name.into(), driver, config }
    }

    /// Build the picker named `name` from configuration.
    ///
    /// A picker without a config section is accepted when its name is a
    /// driver name.
    pub fn from_config(name: &str, config: &Config) -> PalResult<Self> {
        let picker_config = match config.pickers.get(name) {
            Some(c) => c.clone(),
            None if driver(name).is_some() => PickerConfig::default(),
            None => return Err(PalError::PickerNotFound(name.to_string())),
        };

        let driver_name = picker_config.driver.as_deref().unwrap_or(name);
        let driver = driver(driver_name).ok_or_else(|| PalError::UnknownDriver {
            picker: name.to_string(),
            driver: driver_name.to_string(),
        })?;

        Ok(Self::new(name, driver, picker_config))
    }

    /// Picker name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Driver this picker speaks.
    pub fn driver(&self) -> &'static dyn PickerDriver {
        self.driver
    }

    /// Build the picker invocation for a listing.
    ///
    /// Entries that are not JSON objects are dropped and do not take an
    /// index. Pure and deterministic: the same inputs always give the same
    /// argv and stdin, which is what lets the replay cache store the result.
    pub fn prepare(&self, palette: &str, items: Vec<Value>) -> Prepared {
        let bin = self.config.bin.as_deref().unwrap_or_else(|| self.driver.default_bin());

        let items: Vec<Item> = items.into_iter().filter_map(Item::from_value).collect();
        let lines: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| self.driver.format_line(idx, palette, item))
            .collect();

        let mut cmd = vec![expand_path(bin).to_string_lossy().into_owned()];
        cmd.extend(self.driver.flags(palette));
        cmd.extend(self.config.args.iter().cloned());

        Prepared { invocation: Invocation { cmd, input: lines.join("\n") }, items }
    }

    /// Show `items` and return the selected one.
    pub fn run(
        &self,
        palette: &str,
        items: Vec<Value>,
        process: &dyn PickerProcess,
    ) -> PalResult<Option<Item>> {
        let prepared = self.prepare(palette, items);
        select(self.driver, &prepared.invocation, &prepared.items, process)
    }
}

/// Spawn a prepared invocation and map the picker's answer onto `items`.
///
/// Cancellation, empty output, and an index that is not a number or is out
/// of range all mean "no selection".
pub fn select(
    driver: &dyn PickerDriver,
    invocation: &Invocation,
    items: &[Item],
    process: &dyn PickerProcess,
) -> PalResult<Option<Item>> {
    if items.is_empty() {
        tracing::debug!("Nothing to pick from");
        return Ok(None);
    }

    let Some(stdout) = process.spawn(invocation)? else {
        return Ok(None);
    };
    if stdout.trim().is_empty() {
        return Ok(None);
    }

    match driver.parse_index(&stdout) {
        Some(idx) if idx < items.len() => Ok(Some(items[idx].clone())),
        other => {
            tracing::debug!(index = ?other, output = %stdout.trim(), "Ignoring picker output");
            Ok(None)
        }
    }
}

/// Replace characters that would break a line-oriented picker protocol.
pub(crate) fn sanitize(field: &str) -> String {
    field.chars().map(|c| if matches!(c, '\t' | '\n' | '\r' | '\0') { ' ' } else { c }).collect()
}

//! Orchestration: resolve, list, pick, dispatch.
//!
//! There are two ways in. The cold path ([`Runner::run_palette`]) resolves
//! the palette, lists it, and optionally records the exact picker
//! invocation in the replay cache. The fast path ([`replay_cached`]) runs
//! before configuration is even loaded: it replays a recorded invocation and
//! dispatches the selected item by its own fields. It can never call a
//! palette's `pick`, since that needs the resolution it skips.

use crate::core::{
    ActionKind, CacheEntry, Config, Dispatch, Dispatcher, PalError, PalResult, ReplayCache,
};
use crate::palette::{Listing, Palette, PaletteContext, PickOutcome};
use crate::picker::{self, select, Picker, PickerProcess, Prepared};
use crate::platform::Platform;
use crate::plugin::GitCloner;

/// Process-facing collaborators of a run.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    /// Desktop capabilities
    pub platform: &'a dyn Platform,

    /// Spawns the picker
    pub process: &'a dyn PickerProcess,

    /// Clones git-hosted plugins
    pub cloner: &'a dyn GitCloner,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The picker was closed or returned nothing usable.
    NoSelection,
    /// The selected item's own action ran.
    Dispatched(ActionKind),
    /// The selection was handed to the palette's `pick`.
    Delegated { palette: String, name: String },
    /// An item was selected but there was nothing to do with it.
    NothingToDo,
}

/// Result of trying the fast path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastPath {
    /// No usable cache entry; run the cold path.
    Miss,
    /// The cached invocation was replayed. `None` means no selection.
    Replayed(Option<Dispatch>),
}

/// Runs palettes with one picker.
///
/// The picker is looked up when a palette is shown, so listing and picking
/// by name work even when the picker is not configured.
pub struct Runner<'a> {
    config: &'a Config,
    picker: String,
    services: Services<'a>,
    cache: ReplayCache,
}

impl<'a> Runner<'a> {
    /// Create a runner for the picker called `picker`.
    pub fn new(config: &'a Config, picker: &str, services: Services<'a>) -> Self {
        Self { config, picker: picker.to_string(), services, cache: ReplayCache::from_env() }
    }

    /// Use a specific replay cache.
    #[must_use]
    pub fn with_cache(mut self, cache: ReplayCache) -> Self {
        self.cache = cache;
        self
    }

    /// Name of the picker used by [`Runner::run_palette`].
    pub fn picker_name(&self) -> &str {
        &self.picker
    }

    fn context(&self) -> PaletteContext<'a> {
        PaletteContext::new(self.config, self.services.platform, self.services.cloner)
    }

    /// Cold path: show `name` in the picker and act on the selection.
    ///
    /// A pick that opens another palette (the `palettes` builtin) continues
    /// in the same runner.
    pub fn run_palette(&self, name: &str) -> PalResult<RunOutcome> {
        let picker = Picker::from_config(&self.picker, self.config)?;
        let ctx = self.context();
        let mut current = name.to_string();

        loop {
            let palette = Palette::resolve(&current, &ctx)?;
            let listing = palette.list(&ctx)?;
            report_failures(&current, &listing);

            let complete = listing.failures.is_empty();
            let prepared = picker.prepare(&current, listing.items);
            if palette.config().cache {
                self.record(&picker, &current, &prepared, complete);
            }

            let selected = select(
                picker.driver(),
                &prepared.invocation,
                &prepared.items,
                self.services.process,
            )?;
            let Some(item) = selected else {
                return Ok(RunOutcome::NoSelection);
            };

            match Dispatcher::new(self.services.platform).dispatch(&item)? {
                Dispatch::Handled(kind) => return Ok(RunOutcome::Dispatched(kind)),
                Dispatch::Unhandled if palette.auto_pick() => return Ok(RunOutcome::NothingToDo),
                Dispatch::Unhandled => {}
            }

            let item_name = item.name();
            match palette.pick(&ctx, &item_name)? {
                PickOutcome::Done => {
                    return Ok(RunOutcome::Delegated { palette: current, name: item_name })
                }
                PickOutcome::Open(next) => {
                    tracing::debug!(from = %current, to = %next, "Opening palette");
                    current = next;
                }
                PickOutcome::NotFound => {
                    tracing::debug!(
                        palette = %current,
                        item = %item_name,
                        "Palette has no such item"
                    );
                    return Ok(RunOutcome::NothingToDo);
                }
            }
        }
    }

    /// Store `prepared` as the replay entry for `palette`.
    ///
    /// A listing with skipped members or no items is not recorded, since
    /// the fast path would keep replaying it until the next refresh.
    fn record(&self, picker: &Picker, palette: &str, prepared: &Prepared, complete: bool) {
        if !complete {
            tracing::warn!(palette, "Not caching a listing with skipped members");
            return;
        }
        if prepared.items.is_empty() {
            tracing::warn!(palette, "Not caching an empty listing");
            return;
        }

        let entry = CacheEntry {
            invocation: prepared.invocation.clone(),
            items: prepared.items.clone(),
            driver: Some(picker.driver().name().to_string()),
        };
        if let Err(e) = self.cache.store(picker.name(), palette, &entry) {
            tracing::warn!(palette, error = %e, "Failed to write cache entry");
        }
    }

    /// List a palette without showing a picker.
    pub fn list_palette(&self, name: &str) -> PalResult<Listing> {
        let ctx = self.context();
        let listing = Palette::resolve(name, &ctx)?.list(&ctx)?;
        report_failures(name, &listing);
        Ok(listing)
    }

    /// Act on the item called `item_name` as if it had been picked.
    pub fn pick_item(&self, palette_name: &str, item_name: &str) -> PalResult<RunOutcome> {
        let ctx = self.context();
        let palette = Palette::resolve(palette_name, &ctx)?;

        match palette.pick(&ctx, item_name)? {
            PickOutcome::Done => Ok(RunOutcome::Delegated {
                palette: palette_name.to_string(),
                name: item_name.to_string(),
            }),
            PickOutcome::Open(next) => self.run_palette(&next),
            PickOutcome::NotFound => Err(PalError::ItemNotFound {
                palette: palette_name.to_string(),
                name: item_name.to_string(),
            }),
        }
    }
}

fn report_failures(palette: &str, listing: &Listing) {
    for failure in &listing.failures {
        tracing::warn!(
            palette,
            member = %failure.palette,
            reason = %failure.reason,
            "Skipped palette member"
        );
    }
}

/// Fast path: replay the cached invocation for (`picker`, `palette`).
///
/// Needs no configuration. The selected item is dispatched by its own
/// fields only; an item without an action does nothing here.
pub fn replay_cached(
    cache: &ReplayCache,
    picker: &str,
    palette: &str,
    process: &dyn PickerProcess,
    platform: &dyn Platform,
) -> PalResult<FastPath> {
    let Some(entry) = cache.load(picker, palette) else {
        return Ok(FastPath::Miss);
    };

    let driver_name = entry.driver.as_deref().unwrap_or(picker);
    let Some(driver) = picker::driver(driver_name) else {
        tracing::warn!(picker, driver = driver_name, "Cache entry names an unknown driver");
        return Ok(FastPath::Miss);
    };

    tracing::debug!(picker, palette, items = entry.items.len(), "Replaying cached invocation");
    let Some(item) = select(driver, &entry.invocation, &entry.items, process)? else {
        return Ok(FastPath::Replayed(None));
    };

    let dispatch = Dispatcher::new(platform).dispatch(&item)?;
    if dispatch == Dispatch::Unhandled {
        tracing::debug!(item = %item.name(), "Cached item has no action");
    }
    Ok(FastPath::Replayed(Some(dispatch)))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use tempfile::TempDir;

    use super::*;
    use crate::core::Invocation;
    use crate::palette::tests::{config, FakePlatform, NoClone};

    /// Picker double answering from a script, one answer per spawn.
    #[derive(Default)]
    struct Scripted {
        answers: RefCell<VecDeque<Option<String>>>,
        seen: RefCell<Vec<Invocation>>,
    }

    impl Scripted {
        fn new(answers: &[Option<&str>]) -> Self {
            Self {
                answers: RefCell::new(answers.iter().map(|a| a.map(String::from)).collect()),
                seen: RefCell::default(),
            }
        }
    }

    impl PickerProcess for Scripted {
        fn spawn(&self, invocation: &Invocation) -> PalResult<Option<String>> {
            self.seen.borrow_mut().push(invocation.clone());
            Ok(self.answers.borrow_mut().pop_front().flatten())
        }
    }

    fn services<'a>(platform: &'a FakePlatform, process: &'a Scripted) -> Services<'a> {
        Services { platform, process, cloner: &NoClone }
    }

    const TWO_ITEMS: &str = r#"
        [palettes.two]
        base = "commands"
        auto_pick = true
        data = [{ name = "A", cmd = "echo A" }, { name = "B", url = "https://x" }]
    "#;

    #[test]
    fn test_url_item_is_opened_not_run() {
        let config = config(TWO_ITEMS);
        let platform = FakePlatform::default();
        let process = Scripted::new(&[Some("1\t[two]\tB\t")]);
        let temp = TempDir::new().unwrap();
        let runner = Runner::new(&config, "fzf", services(&platform, &process))
            .with_cache(ReplayCache::new(temp.path()));

        assert_eq!(runner.run_palette("two").unwrap(), RunOutcome::Dispatched(ActionKind::Url));
        assert_eq!(*platform.calls.borrow(), vec!["url:https://x"]);
    }

    #[test]
    fn test_cancel_is_no_selection() {
        let config = config(TWO_ITEMS);
        let platform = FakePlatform::default();
        let process = Scripted::new(&[None]);
        let temp = TempDir::new().unwrap();
        let runner = Runner::new(&config, "rofi", services(&platform, &process))
            .with_cache(ReplayCache::new(temp.path()));

        assert_eq!(runner.run_palette("two").unwrap(), RunOutcome::NoSelection);
        assert!(platform.calls.borrow().is_empty());
    }

    #[test]
    fn test_cold_run_writes_cache_and_fast_path_replays() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("items.jsonl");
        std::fs::write(
            &data,
            "{\"name\": \"A\", \"cmd\": \"echo A\"}\n{\"name\": \"B\", \"url\": \"https://x\"}\n",
        )
        .unwrap();
        let config = config(&format!(
            "[palettes.cached]\nbase = 'commands'\ncache = true\ndata_file = '{}'\n",
            data.display()
        ));
        let cache = ReplayCache::new(dir.path().join("cache"));
        let platform = FakePlatform::default();

        let cold = Scripted::new(&[None]);
        let runner = Runner::new(&config, "fzf", services(&platform, &cold))
            .with_cache(cache.clone());
        assert_eq!(runner.run_palette("cached").unwrap(), RunOutcome::NoSelection);

        let entry = cache.load("fzf", "cached").unwrap();
        assert_eq!(entry.items.len(), 2);
        assert_eq!(entry.invocation, cold.seen.borrow()[0]);
        assert_eq!(entry.driver.as_deref(), Some("fzf"));

        // the source is gone; the fast path must not need it
        std::fs::remove_file(&data).unwrap();

        let fast = Scripted::new(&[Some("0\t[cached]\tA\t")]);
        let outcome = replay_cached(&cache, "fzf", "cached", &fast, &platform).unwrap();
        assert_eq!(outcome, FastPath::Replayed(Some(Dispatch::Handled(ActionKind::Command))));
        assert_eq!(fast.seen.borrow()[0], entry.invocation);
        assert_eq!(*platform.calls.borrow(), vec!["sh:echo A"]);
    }

    #[test]
    fn test_fast_path_miss_without_entry() {
        let temp = TempDir::new().unwrap();
        let platform = FakePlatform::default();
        let process = Scripted::new(&[Some("0")]);

        let cache = ReplayCache::new(temp.path());
        let outcome = replay_cached(&cache, "fzf", "nothing", &process, &platform).unwrap();
        assert_eq!(outcome, FastPath::Miss);
        assert!(process.seen.borrow().is_empty());
    }

    #[test]
    fn test_fast_path_uses_recorded_driver() {
        let temp = TempDir::new().unwrap();
        let cache = ReplayCache::new(temp.path());
        let entry = CacheEntry {
            invocation: Invocation { cmd: vec!["my-menu".into()], input: "a\nb".into() },
            items: vec![
                crate::core::Item::new("a").with("copy", "alpha"),
                crate::core::Item::new("b").with("copy", "beta"),
            ],
            driver: Some("rofi".into()),
        };
        cache.store("menu", "clips", &entry).unwrap();

        let platform = FakePlatform::default();
        let process = Scripted::new(&[Some("1\n")]);
        let outcome = replay_cached(&cache, "menu", "clips", &process, &platform).unwrap();
        assert_eq!(outcome, FastPath::Replayed(Some(Dispatch::Handled(ActionKind::Copy))));
        assert_eq!(*platform.calls.borrow(), vec!["copy:beta"]);
    }

    #[test]
    fn test_item_without_action_goes_to_palette_pick() {
        let config = config(
            r#"
            [palettes.plain]
            base = "apps"
            "#,
        );
        let platform = FakePlatform {
            apps: vec![crate::core::Item::new("Firefox")],
            ..Default::default()
        };
        let process = Scripted::new(&[Some("0")]);
        let temp = TempDir::new().unwrap();
        let runner = Runner::new(&config, "rofi", services(&platform, &process))
            .with_cache(ReplayCache::new(temp.path()));

        assert_eq!(
            runner.run_palette("plain").unwrap(),
            RunOutcome::Delegated { palette: "plain".into(), name: "Firefox".into() }
        );
        assert_eq!(*platform.calls.borrow(), vec!["app:Firefox"]);
    }

    #[test]
    fn test_auto_pick_never_delegates() {
        let config = config(
            r#"
            [palettes.notes]
            base = "commands"
            auto_pick = true
            data = [{ name = "no action" }]
            "#,
        );
        let platform = FakePlatform::default();
        let process = Scripted::new(&[Some("0\t[notes]\tno action\t")]);
        let temp = TempDir::new().unwrap();
        let runner = Runner::new(&config, "fzf", services(&platform, &process))
            .with_cache(ReplayCache::new(temp.path()));

        assert_eq!(runner.run_palette("notes").unwrap(), RunOutcome::NothingToDo);
        assert!(platform.calls.borrow().is_empty());
    }

    #[test]
    fn test_palettes_index_opens_chosen_palette() {
        let config = config(TWO_ITEMS);
        let platform = FakePlatform::default();
        // index lists apps, combine, commands, two; pick "two", then "A"
        let process = Scripted::new(&[Some("3"), Some("0")]);
        let temp = TempDir::new().unwrap();
        let runner = Runner::new(&config, "rofi", services(&platform, &process))
            .with_cache(ReplayCache::new(temp.path()));

        assert_eq!(
            runner.run_palette("palettes").unwrap(),
            RunOutcome::Dispatched(ActionKind::Command)
        );
        assert_eq!(process.seen.borrow().len(), 2);
        assert_eq!(*platform.calls.borrow(), vec!["sh:echo A"]);
    }

    #[test]
    fn test_pick_item_by_name() {
        let config = config(TWO_ITEMS);
        let platform = FakePlatform::default();
        let process = Scripted::default();
        let runner = Runner::new(&config, "fzf", services(&platform, &process));

        assert_eq!(
            runner.pick_item("two", "B").unwrap(),
            RunOutcome::Delegated { palette: "two".into(), name: "B".into() }
        );
        assert!(matches!(
            runner.pick_item("two", "Z"),
            Err(PalError::ItemNotFound { .. })
        ));
        assert_eq!(*platform.calls.borrow(), vec!["url:https://x"]);
    }

    #[test]
    fn test_unknown_picker_fails_only_when_shown() {
        let config = config(TWO_ITEMS);
        let platform = FakePlatform::default();
        let process = Scripted::default();
        let runner = Runner::new(&config, "dmenu", services(&platform, &process));

        assert!(matches!(runner.run_palette("two"), Err(PalError::PickerNotFound(_))));
        assert!(process.seen.borrow().is_empty());

        assert_eq!(runner.list_palette("two").unwrap().items.len(), 2);
        assert_eq!(
            runner.pick_item("two", "A").unwrap(),
            RunOutcome::Delegated { palette: "two".into(), name: "A".into() }
        );
        assert_eq!(*platform.calls.borrow(), vec!["sh:echo A"]);
    }

    #[test]
    fn test_listing_with_skipped_member_is_not_cached() {
        let config = config(&format!(
            "{TWO_ITEMS}\n[palettes.mixed]\nbase = 'combine'\ncache = true\ninclude = ['two', 'missing']\n"
        ));
        let temp = TempDir::new().unwrap();
        let cache = ReplayCache::new(temp.path());
        let platform = FakePlatform::default();
        let process = Scripted::new(&[None]);
        let runner =
            Runner::new(&config, "fzf", services(&platform, &process)).with_cache(cache.clone());

        assert_eq!(runner.run_palette("mixed").unwrap(), RunOutcome::NoSelection);
        assert_eq!(process.seen.borrow().len(), 1);
        assert!(cache.load("fzf", "mixed").is_none());
    }

    #[test]
    fn test_empty_listing_is_not_cached() {
        let config = config(
            r#"
            [palettes.empty]
            base = "commands"
            cache = true
            "#,
        );
        let temp = TempDir::new().unwrap();
        let cache = ReplayCache::new(temp.path());
        let platform = FakePlatform::default();
        let process = Scripted::default();
        let runner =
            Runner::new(&config, "fzf", services(&platform, &process)).with_cache(cache.clone());

        assert_eq!(runner.run_palette("empty").unwrap(), RunOutcome::NoSelection);
        assert!(cache.load("fzf", "empty").is_none());
        assert!(cache.list().unwrap().is_empty());
    }
}

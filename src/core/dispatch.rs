//! Action dispatcher: act on an item by its own fields.

use super::error::PalResult;
use super::item::{Action, Item};
use crate::platform::Platform;

/// Kind of action that was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Ran `cmd` through the shell
    Command,
    /// Opened `url`
    Url,
    /// Opened `file`
    File,
    /// Copied `copy`
    Copy,
}

impl ActionKind {
    /// All kinds, in dispatch order.
    pub const ALL: [Self; 4] = [Self::Command, Self::Url, Self::File, Self::Copy];

    /// Item field carrying this action.
    pub const fn field(self) -> &'static str {
        match self {
            Self::Command => "cmd",
            Self::Url => "url",
            Self::File => "file",
            Self::Copy => "copy",
        }
    }

    /// Look up a kind by its item field name.
    pub fn from_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.field() == field)
    }
}

/// Outcome of dispatching an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The item carried an action and it was performed.
    Handled(ActionKind),
    /// The item carries no action field.
    Unhandled,
}

/// Runs the first action field present on an item: `cmd`, `url`, `file`,
/// then `copy`.
pub struct Dispatcher<'a> {
    platform: &'a dyn Platform,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher over a platform.
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self { platform }
    }

    /// Perform at most one action for `item`.
    pub fn dispatch(&self, item: &Item) -> PalResult<Dispatch> {
        let Some(action) = item.action() else {
            tracing::debug!(item = %item.name(), "Item has no action");
            return Ok(Dispatch::Unhandled);
        };

        tracing::debug!(item = %item.name(), ?action, "Dispatching");
        let (kind, value) = match action {
            Action::Command(cmd) => (ActionKind::Command, cmd),
            Action::Url(url) => (ActionKind::Url, url),
            Action::File(path) => (ActionKind::File, path),
            Action::Copy(text) => (ActionKind::Copy, text),
        };
        self.perform(kind, value)?;
        Ok(Dispatch::Handled(kind))
    }

    /// Perform one action on a bare value, without an item.
    pub fn perform(&self, kind: ActionKind, value: &str) -> PalResult<()> {
        match kind {
            ActionKind::Command => self.platform.run_shell(value),
            ActionKind::Url => self.platform.open_url(value),
            ActionKind::File => self.platform.open_file(value),
            ActionKind::Copy => self.platform.copy_to_clipboard(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    impl Platform for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }
        fn list_apps(&self) -> PalResult<Vec<Item>> {
            Ok(Vec::new())
        }
        fn run_app(&self, app: &Item) -> PalResult<()> {
            self.calls.borrow_mut().push(format!("app:{}", app.name()));
            Ok(())
        }
        fn open_url(&self, url: &str) -> PalResult<()> {
            self.calls.borrow_mut().push(format!("url:{url}"));
            Ok(())
        }
        fn open_file(&self, path: &str) -> PalResult<()> {
            self.calls.borrow_mut().push(format!("file:{path}"));
            Ok(())
        }
        fn copy_to_clipboard(&self, text: &str) -> PalResult<()> {
            self.calls.borrow_mut().push(format!("copy:{text}"));
            Ok(())
        }
        fn run_shell(&self, command_line: &str) -> PalResult<()> {
            self.calls.borrow_mut().push(format!("sh:{command_line}"));
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_each_kind() {
        let platform = Recorder::default();
        let dispatcher = Dispatcher::new(&platform);

        let cases = [
            (Item::new("a").with("cmd", "echo a"), ActionKind::Command, "sh:echo a"),
            (Item::new("b").with("url", "https://x"), ActionKind::Url, "url:https://x"),
            (Item::new("c").with("file", "/etc/hosts"), ActionKind::File, "file:/etc/hosts"),
            (Item::new("d").with("copy", "secret"), ActionKind::Copy, "copy:secret"),
        ];
        for (item, kind, call) in cases {
            assert_eq!(dispatcher.dispatch(&item).unwrap(), Dispatch::Handled(kind));
            assert_eq!(platform.calls.borrow().last().map(String::as_str), Some(call));
        }
    }

    #[test]
    fn test_only_first_action_runs() {
        let platform = Recorder::default();
        let item = Item::new("x").with("copy", "c").with("url", "https://u");
        Dispatcher::new(&platform).dispatch(&item).unwrap();
        assert_eq!(*platform.calls.borrow(), vec!["url:https://u"]);
    }

    #[test]
    fn test_kinds_match_item_fields() {
        let fields: Vec<_> = ActionKind::ALL.iter().map(|k| k.field()).collect();
        assert_eq!(fields, crate::core::ACTION_FIELDS);
        assert_eq!(ActionKind::from_field("url"), Some(ActionKind::Url));
        assert_eq!(ActionKind::from_field("open"), None);
    }

    #[test]
    fn test_perform_bare_value() {
        let platform = Recorder::default();
        let dispatcher = Dispatcher::new(&platform);
        dispatcher.perform(ActionKind::Copy, "token").unwrap();
        dispatcher.perform(ActionKind::File, "/tmp/notes.md").unwrap();
        assert_eq!(*platform.calls.borrow(), vec!["copy:token", "file:/tmp/notes.md"]);
    }

    #[test]
    fn test_item_without_action() {
        let platform = Recorder::default();
        let result = Dispatcher::new(&platform).dispatch(&Item::new("plain")).unwrap();
        assert_eq!(result, Dispatch::Unhandled);
        assert!(platform.calls.borrow().is_empty());
    }
}

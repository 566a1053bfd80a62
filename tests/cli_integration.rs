//! CLI Integration Tests
//!
//! Tests the command-line interface end-to-end. Pickers are replaced by
//! small shell scripts that answer with a fixed line, so nothing here needs
//! fzf or rofi installed.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Get the binary to test, isolated from the user's config and cache.
fn pal(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pal").unwrap();
    cmd.current_dir(temp.path())
        .env_remove("PAL_CONFIG")
        .env_remove("RUST_LOG")
        .env("PAL_CACHE_DIR", temp.path().join("cache"))
        .env("XDG_CONFIG_HOME", temp.path().join("xdg"))
        .env("XDG_DATA_HOME", temp.path().join("xdg-data"))
        .env("XDG_DATA_DIRS", temp.path().join("no-system-apps"));
    cmd
}

/// Write an executable script.
#[cfg(unix)]
fn script(temp: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let file = temp.child(name);
    file.write_str(&format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
    file.path().to_path_buf()
}

/// Write a config file with a fake fzf-protocol picker named `fake`.
fn config_with(temp: &TempDir, picker_bin: &str, palettes: &str) -> std::path::PathBuf {
    let file = temp.child("config.toml");
    file.write_str(&format!(
        "[pickers.fake]\ndriver = \"fzf\"\nbin = '{picker_bin}'\n\n{palettes}"
    ))
    .unwrap();
    file.path().to_path_buf()
}

const TWO_ITEMS: &str = r#"
[palettes.two]
base = "commands"
auto_pick = true
data = [
    { name = "A", desc = "first", cmd = "echo RAN-A" },
    { name = "B", cmd = "echo RAN-B" },
]
"#;

// ============================================================================
// Help & Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    let temp = TempDir::new().unwrap();
    pal(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: pal"));
}

#[test]
fn test_version_flag() {
    let temp = TempDir::new().unwrap();
    pal(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_run_help_mentions_refresh() {
    let temp = TempDir::new().unwrap();
    pal(&temp).args(["run", "--help"]).assert().success().stdout(predicate::str::contains("--refresh"));
}

// ============================================================================
// List & Pick Tests
// ============================================================================

#[test]
fn test_list_jsonl() {
    let temp = TempDir::new().unwrap();
    let config = config_with(&temp, "true", TWO_ITEMS);

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["list", "two"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""name":"A""#))
        .stdout(predicate::str::contains(r#""cmd":"echo RAN-B""#));
}

#[test]
fn test_list_text() {
    let temp = TempDir::new().unwrap();
    let config = config_with(&temp, "true", TWO_ITEMS);

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["list", "two", "--format", "text"])
        .assert()
        .success()
        .stdout("A\tfirst\nB\n");
}

#[test]
fn test_list_unknown_format() {
    let temp = TempDir::new().unwrap();
    let config = config_with(&temp, "true", TWO_ITEMS);

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["list", "two", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}

#[test]
fn test_list_unknown_palette() {
    let temp = TempDir::new().unwrap();
    let config = config_with(&temp, "true", "");

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["list", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Palette not found: nope"));
}

#[test]
fn test_list_combine_skips_broken_member() {
    let temp = TempDir::new().unwrap();
    let config = config_with(
        &temp,
        "true",
        r#"
[palettes.all]
base = "combine"
include = ["two", "ghost"]
"#,
    );
    let config_text = std::fs::read_to_string(&config).unwrap();
    std::fs::write(&config, format!("{config_text}\n{TWO_ITEMS}")).unwrap();

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["list", "all", "--format", "text"])
        .assert()
        .success()
        .stdout("A\tfirst\nB\n")
        .stderr(predicate::str::contains("Skipped palette member"));
}

#[test]
fn test_pick_runs_command() {
    let temp = TempDir::new().unwrap();
    let config = config_with(&temp, "true", TWO_ITEMS);

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["pick", "two", "B"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RAN-B"));
}

#[test]
fn test_pick_missing_item() {
    let temp = TempDir::new().unwrap();
    let config = config_with(&temp, "true", TWO_ITEMS);

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["pick", "two", "Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No item named 'Z'"));
}

#[test]
fn test_list_and_pick_ignore_unknown_default_picker() {
    let temp = TempDir::new().unwrap();
    let config = temp.child("config.toml");
    config.write_str(&format!("[general]\ndefault_picker = \"dmenu\"\n{TWO_ITEMS}")).unwrap();

    pal(&temp)
        .arg("-c")
        .arg(config.path())
        .args(["list", "two", "--format", "text"])
        .assert()
        .success()
        .stdout("A\tfirst\nB\n");

    pal(&temp)
        .arg("-c")
        .arg(config.path())
        .args(["pick", "two", "B"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RAN-B"));

    pal(&temp)
        .arg("-c")
        .arg(config.path())
        .args(["run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Picker not found: dmenu"));
}

// ============================================================================
// Builtin Palette & Action Tests
// ============================================================================

#[test]
fn test_ssh_palette_lists_configured_hosts() {
    let temp = TempDir::new().unwrap();
    let ssh_config = temp.child("ssh_config");
    ssh_config.write_str("Host web bastion\nHost *\n    User me\n").unwrap();
    let config = config_with(
        &temp,
        "true",
        &format!(
            "[palettes.ssh]\nssh_config = '{}'\nknown_hosts = false\n",
            ssh_config.path().display()
        ),
    );

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["list", "ssh", "--format", "text"])
        .assert()
        .success()
        .stdout("bastion\nweb\n");
}

#[cfg(unix)]
#[test]
fn test_ssh_pick_uses_terminal_prefix() {
    let temp = TempDir::new().unwrap();
    let ssh_config = temp.child("ssh_config");
    ssh_config.write_str("Host web\n").unwrap();
    let config = config_with(
        &temp,
        "true",
        &format!(
            "[palettes.ssh]\nssh_config = '{}'\nknown_hosts = false\nterminal = 'echo OPEN'\n",
            ssh_config.path().display()
        ),
    );

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["pick", "ssh", "web"])
        .assert()
        .success()
        .stdout("OPEN ssh web\n");
}

#[test]
fn test_bookmarks_palette_lists_chrome_file() {
    let temp = TempDir::new().unwrap();
    let bookmarks = temp.child("Bookmarks");
    bookmarks
        .write_str(
            r#"{"roots": {"bookmark_bar": {"type": "folder", "children": [
                {"type": "url", "name": "Docs", "url": "https://docs.rs"},
                {"type": "url", "name": "Crates", "url": "https://crates.io"}
            ]}}}"#,
        )
        .unwrap();
    let config = config_with(
        &temp,
        "true",
        &format!(
            "[palettes.links]\nbase = 'bookmarks'\nbrowser = 'chrome'\nbookmarks_file = '{}'\n",
            bookmarks.path().display()
        ),
    );

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["list", "links"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""url":"https://docs.rs""#))
        .stdout(predicate::str::contains(r#""name":"Crates""#));
}

#[test]
fn test_action_runs_value() {
    let temp = TempDir::new().unwrap();
    pal(&temp)
        .args(["action", "cmd", "echo ACTED"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ACTED"));
}

#[test]
fn test_action_reads_stdin() {
    let temp = TempDir::new().unwrap();
    pal(&temp)
        .args(["action", "cmd"])
        .write_stdin("echo PIPED\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("PIPED"));
}

#[test]
fn test_action_rejects_unknown_kind_and_empty_value() {
    let temp = TempDir::new().unwrap();
    pal(&temp)
        .args(["action", "open", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown action: open"));

    pal(&temp)
        .args(["action", "copy"])
        .write_stdin("\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("the value is empty"));
}

// ============================================================================
// Run Tests
// ============================================================================

#[cfg(unix)]
#[test]
fn test_run_dispatches_selected_line() {
    let temp = TempDir::new().unwrap();
    let picker = script(&temp, "picker", r#"printf '%s\n' "$@" > args.txt; sed -n 2p"#);
    let config = config_with(&temp, &picker.display().to_string(), TWO_ITEMS);

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["run", "fake", "two"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RAN-B"))
        .stdout(predicate::str::contains("RAN-A").not());

    temp.child("args.txt").assert(predicate::str::contains("--with-nth=2,3,4"));
    temp.child("args.txt").assert(predicate::str::contains("two> "));
}

#[cfg(unix)]
#[test]
fn test_run_cancelled_picker() {
    let temp = TempDir::new().unwrap();
    let picker = script(&temp, "picker", "cat > /dev/null; exit 130");
    let config = config_with(&temp, &picker.display().to_string(), TWO_ITEMS);

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["run", "fake", "two"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[cfg(unix)]
#[test]
fn test_run_out_of_range_index() {
    let temp = TempDir::new().unwrap();
    let picker = script(&temp, "picker", "cat > /dev/null; echo '7\tbogus'");
    let config = config_with(&temp, &picker.display().to_string(), TWO_ITEMS);

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["run", "fake", "two"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_run_missing_picker_binary() {
    let temp = TempDir::new().unwrap();
    let config = config_with(&temp, "/no/such/picker", TWO_ITEMS);

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["run", "fake", "two"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Picker failed"));
}

#[test]
fn test_run_unknown_picker() {
    let temp = TempDir::new().unwrap();
    let config = config_with(&temp, "true", TWO_ITEMS);

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["run", "dmenu", "two"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Picker not found: dmenu"));
}

// ============================================================================
// Replay Cache Tests
// ============================================================================

#[cfg(unix)]
#[test]
fn test_cached_palette_replays_without_config() {
    let temp = TempDir::new().unwrap();
    let picker = script(&temp, "picker", "head -n 1");
    let config = config_with(
        &temp,
        &picker.display().to_string(),
        r#"
[palettes.cached]
base = "commands"
cache = true
data = [{ name = "A", cmd = "echo FROM-CACHE" }]
"#,
    );

    // cold run writes the entry
    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["run", "fake", "cached"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FROM-CACHE"));
    temp.child("cache/fe/fake/cached.json").assert(predicate::path::exists());

    // with the config gone, only the fast path can serve this
    std::fs::remove_file(&config).unwrap();
    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["run", "fake", "cached"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FROM-CACHE"));

    // --refresh skips the fast path and needs the config again
    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["run", "--refresh", "fake", "cached"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[cfg(unix)]
#[test]
fn test_cache_list_and_clear() {
    let temp = TempDir::new().unwrap();
    let picker = script(&temp, "picker", "cat > /dev/null; exit 1");
    let config = config_with(
        &temp,
        &picker.display().to_string(),
        "[palettes.cached]\nbase = \"commands\"\ncache = true\ndata = [{ name = \"A\", cmd = \"true\" }]\n\n\
         [palettes.empty]\nbase = \"commands\"\ncache = true\n",
    );

    pal(&temp).arg("-c").arg(&config).args(["run", "fake", "cached"]).assert().success();
    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["run", "fake", "empty"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Not caching an empty listing"));

    pal(&temp)
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fake\tcached\t"));

    pal(&temp)
        .args(["cache", "clear", "fake"])
        .assert()
        .success()
        .stdout("Removed 1 cache entry\n");

    pal(&temp).args(["cache", "list"]).assert().success().stdout("No cache entries.\n");
}

#[test]
fn test_cache_path() {
    let temp = TempDir::new().unwrap();
    pal(&temp)
        .args(["cache", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(temp.path().join("cache").join("fe").display().to_string()));
}

// ============================================================================
// Plugin Tests
// ============================================================================

#[cfg(unix)]
#[test]
fn test_local_plugin_list_and_pick() {
    let temp = TempDir::new().unwrap();
    let plugin = script(
        &temp,
        "pal-hosts",
        r#"case "$1" in
list) echo '{"name": "web"}'; echo '{"name": "db", "desc": "'"$PAL_PALETTE"'"}' ;;
pick) echo "connecting to $2" ;;
*) exit 2 ;;
esac"#,
    );
    let config = config_with(
        &temp,
        "true",
        &format!("[palettes.hosts]\nbase = '{}'\n", plugin.display()),
    );

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["list", "hosts", "--format", "text"])
        .assert()
        .success()
        .stdout("web\ndb\thosts\n");

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["pick", "hosts", "db"])
        .assert()
        .success()
        .stdout("connecting to db\n");
}

#[cfg(unix)]
#[test]
fn test_plugin_in_plugins_dir_by_name() {
    let temp = TempDir::new().unwrap();
    temp.child("plugins").create_dir_all().unwrap();
    script(&temp, "plugins/notes", r#"[ "$1" = list ] && echo '{"name": "todo"}'"#);
    let config = config_with(
        &temp,
        "true",
        &format!(
            "[paths]\nplugins_dir = '{}'\n\n[palettes.notes]\n",
            temp.path().join("plugins").display()
        ),
    );

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["list", "notes", "--format", "text"])
        .assert()
        .success()
        .stdout("todo\n");
}

#[cfg(unix)]
#[test]
fn test_failing_plugin_aborts() {
    let temp = TempDir::new().unwrap();
    let plugin = script(&temp, "broken", "echo 'boom' >&2; exit 3");
    let config = config_with(
        &temp,
        "true",
        &format!("[palettes.broken]\nbase = '{}'\n", plugin.display()),
    );

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["list", "broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("boom"));
}

#[test]
fn test_plugins_list_empty() {
    let temp = TempDir::new().unwrap();
    let config = config_with(
        &temp,
        "true",
        &format!("[paths]\ncache_dir = '{}'\n", temp.path().join("cache").display()),
    );

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .args(["plugins", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No plugins cloned."));
}

// ============================================================================
// Config & Misc Tests
// ============================================================================

#[test]
fn test_palettes_command() {
    let temp = TempDir::new().unwrap();
    let config = config_with(
        &temp,
        "true",
        "[palettes.ssh]\nbase = \"github.com/someone/pal-plugins/ssh\"\n\n[palettes.local]\nbase = \"/opt/pal/local\"\n",
    );

    pal(&temp)
        .arg("-c")
        .arg(&config)
        .arg("palettes")
        .assert()
        .success()
        .stdout(predicate::str::contains("combine\tcombine\tbuiltin\n"))
        .stdout(predicate::str::contains("ssh\tgithub.com/someone/pal-plugins/ssh\tgit\n"))
        .stdout(predicate::str::contains("local\t/opt/pal/local\tplugin\n"));
}

#[test]
fn test_config_defaults() {
    let temp = TempDir::new().unwrap();
    pal(&temp)
        .args(["config", "--defaults"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[general]"))
        .stdout(predicate::str::contains("default_picker = \"fzf\""));
}

#[test]
fn test_config_shows_merged_values() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("config.toml");
    file.write_str("[general]\ndefault_picker = \"rofi\"\n").unwrap();

    pal(&temp)
        .arg("-c")
        .arg(file.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("default_picker = \"rofi\""))
        .stdout(predicate::str::contains("default_palette = \"combine\""));
}

#[test]
fn test_local_config_file_is_found() {
    let temp = TempDir::new().unwrap();
    temp.child(".pal.toml").write_str("[general]\ndefault_palette = \"apps\"\n").unwrap();

    pal(&temp)
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".pal.toml"));
}

#[test]
fn test_invalid_config_is_reported() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("config.toml");
    file.write_str("[general\n").unwrap();

    pal(&temp)
        .arg("-c")
        .arg(file.path())
        .arg("palettes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_init_writes_config_once() {
    let temp = TempDir::new().unwrap();

    pal(&temp).arg("init").assert().success().stdout(predicate::str::contains("Wrote"));
    temp.child("xdg/pal/config.toml").assert(predicate::str::contains("[general]"));

    pal(&temp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    pal(&temp).args(["init", "--force"]).assert().success();
}

#[test]
fn test_completions_bash() {
    let temp = TempDir::new().unwrap();
    pal(&temp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_pal"));
}

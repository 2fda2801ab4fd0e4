use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const FAST_BOOT: &str = r#"
[boot]
stage_interval = "20ms"
settle_delay = "20ms"
selector_delay = "10ms"
max_wait = "3s"
"#;

struct Sandbox {
    _root: TempDir,
    config_dir: PathBuf,
    data_dir: PathBuf,
    cache_dir: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let config_dir = root.path().join("config");
        let data_dir = root.path().join("data");
        let cache_dir = root.path().join("cache");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("vistaboot.toml"), FAST_BOOT).unwrap();
        Self {
            _root: root,
            config_dir,
            data_dir,
            cache_dir,
        }
    }

    fn preference_file(&self) -> PathBuf {
        self.config_dir.join("preferences.toml")
    }

    fn run(&self, args: &[&str]) -> Output {
        let output = Command::new(env!("CARGO_BIN_EXE_vistaboot"))
            .env("VISTABOOT_CONFIG_DIR", &self.config_dir)
            .env("VISTABOOT_DATA_DIR", &self.data_dir)
            .env("VISTABOOT_CACHE_DIR", &self.cache_dir)
            .env_remove("VISTABOOT_ASSET")
            .env("RUST_LOG", "warn")
            .args(args)
            .output()
            .expect("failed to run vistaboot");
        assert!(
            output.status.success(),
            "vistaboot {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        output
    }

    fn stdout(&self, args: &[&str]) -> String {
        String::from_utf8(self.run(args).stdout).unwrap()
    }
}

fn stored_id(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    let line = contents
        .lines()
        .find(|line| line.starts_with("ui-version"))?;
    Some(line.split('"').nth(1)?.to_string())
}

#[test]
fn preference_set_show_clear_round_trip() {
    let sandbox = Sandbox::new();

    let shown = sandbox.stdout(&["preference", "show"]);
    assert!(shown.contains("no interface variant stored"), "{shown}");

    sandbox.run(&["preference", "set", "1.0.1"]);
    assert_eq!(
        stored_id(&sandbox.preference_file()).as_deref(),
        Some("1.0.1")
    );
    let shown = sandbox.stdout(&["preference", "show"]);
    assert!(shown.contains("Creator UI (v1.0.1)"), "{shown}");

    sandbox.run(&["preference", "clear"]);
    assert!(!sandbox.preference_file().exists());
    sandbox.run(&["preference", "clear"]);
}

#[test]
fn catalog_json_lists_both_variants() {
    let sandbox = Sandbox::new();
    let stdout = sandbox.stdout(&["catalog", "--json"]);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["default"], "1.0.0");
    let ids: Vec<&str> = report["variants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|variant| variant["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["1.0.0", "1.0.1"]);
}

#[test]
fn first_headless_run_without_selection_leaves_preference_absent() {
    let sandbox = Sandbox::new();
    let stdout = sandbox.stdout(&["--headless"]);
    assert!(stdout.contains("100% Ready"), "{stdout}");
    assert!(stdout.contains("Choose an experience"), "{stdout}");
    assert!(!sandbox.preference_file().exists());
}

#[test]
fn headless_selection_persists_and_mounts_on_next_run() {
    let sandbox = Sandbox::new();

    let first = sandbox.stdout(&["--headless", "--select", "1.0.1"]);
    assert!(first.contains("Choose an experience"), "{first}");
    assert!(first.contains("Creator UI"), "{first}");
    assert_eq!(
        stored_id(&sandbox.preference_file()).as_deref(),
        Some("1.0.1")
    );

    let second = sandbox.stdout(&["--headless"]);
    assert!(!second.contains("Choose an experience"), "{second}");
    assert!(second.contains("Creator UI"), "{second}");
}

#[test]
fn headless_switch_restarts_into_new_variant() {
    let sandbox = Sandbox::new();
    sandbox.run(&["preference", "set", "1.0.0"]);

    let stdout = sandbox.stdout(&["--headless", "--switch", "1.0.1"]);
    let messenger = stdout.find("Messenger UI").expect("messenger mounted first");
    let creator = stdout.rfind("Creator UI").expect("creator mounted after restart");
    assert!(messenger < creator, "{stdout}");
    assert_eq!(
        stored_id(&sandbox.preference_file()).as_deref(),
        Some("1.0.1")
    );
}

#[test]
fn ephemeral_selection_is_not_written() {
    let sandbox = Sandbox::new();
    let stdout = sandbox.stdout(&["--headless", "--ephemeral", "--select", "1.0.0"]);
    assert!(stdout.contains("Messenger UI"), "{stdout}");
    assert!(!sandbox.preference_file().exists());
}

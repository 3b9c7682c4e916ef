use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Shell script standing in for the datree CLI.
///
/// For manifest `$2` it prints `$2.out` to stdout and `$2.err` to stderr,
/// exits with the code in `$2.code` (default 0) and appends its arguments
/// to `calls.log` next to itself.
const FAKE_DATREE: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
m="$2"
[ -f "$m.out" ] && cat "$m.out"
[ -f "$m.err" ] && cat "$m.err" >&2
if [ -f "$m.code" ]; then
  exit "$(cat "$m.code")"
fi
exit 0
"#;

/// TestHarness provides an isolated project directory with a fake datree
/// binary installed at `bin/datree`, an empty `.datree/config.md` and a
/// private home directory so no user-level config leaks into the run.
pub struct TestHarness {
    pub dir: TempDir,
    pub bin_dir: PathBuf,
    pub home_dir: PathBuf,
    #[allow(dead_code)]
    pub config_path: PathBuf,
    #[allow(dead_code)]
    pub cli_binary: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_path = temp_dir.path();

        let bin_dir = base_path.join("bin");
        let home_dir = base_path.join("home");
        fs::create_dir_all(&home_dir).expect("Failed to create home dir");
        let config_path = base_path.join(".datree/config.md");
        fs::create_dir_all(&bin_dir).expect("Failed to create bin dir");
        fs::create_dir_all(config_path.parent().unwrap()).expect("Failed to create config dir");
        fs::write(&config_path, "---\n---\n\n# Datree settings\n").expect("Failed to write config");

        let harness = TestHarness {
            dir: temp_dir,
            bin_dir,
            home_dir,
            config_path,
            cli_binary: PathBuf::from(env!("CARGO_BIN_EXE_datree-validator")),
        };
        harness.install_fake_datree();
        harness
    }

    /// Creates a test harness with custom config content.
    #[allow(dead_code)]
    pub fn with_config(config_content: &str) -> Self {
        let harness = Self::new();
        fs::write(&harness.config_path, config_content).expect("Failed to write custom config");
        harness
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Global config location as the CLI resolves it under `home_dir`.
    #[allow(dead_code)]
    pub fn global_config_path(&self) -> PathBuf {
        #[cfg(target_os = "macos")]
        let config_dir = self.home_dir.join("Library/Application Support");
        #[cfg(not(target_os = "macos"))]
        let config_dir = self.home_dir.join(".config");
        config_dir.join("datree-validator/config.md")
    }

    /// Writes the user-level config the CLI merges under the project config.
    #[allow(dead_code)]
    pub fn with_global_config(&self, config_content: &str) {
        let path = self.global_config_path();
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create global config dir");
        fs::write(&path, config_content).expect("Failed to write global config");
    }

    pub fn datree_binary(&self) -> PathBuf {
        self.bin_dir.join("datree")
    }

    fn install_fake_datree(&self) {
        let path = self.datree_binary();
        fs::write(&path, FAKE_DATREE).expect("Failed to write fake datree");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("Failed to chmod fake datree");
        }
    }

    /// Writes a manifest and the output the fake datree should produce for it.
    pub fn manifest(&self, name: &str, stdout: &str, stderr: &str, code: i32) -> PathBuf {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create manifest dir");
        }
        fs::write(&path, "apiVersion: apps/v1\nkind: Deployment\n").expect("Failed to write manifest");
        let with_suffix = |suffix: &str| PathBuf::from(format!("{}.{}", path.display(), suffix));
        if !stdout.is_empty() {
            fs::write(with_suffix("out"), stdout).expect("Failed to write stdout fixture");
        }
        if !stderr.is_empty() {
            fs::write(with_suffix("err"), stderr).expect("Failed to write stderr fixture");
        }
        fs::write(with_suffix("code"), code.to_string()).expect("Failed to write exit code fixture");
        path
    }

    /// Argument lines the fake datree was invoked with.
    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.bin_dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    /// Executes the CLI with the given arguments in the harness directory.
    #[allow(dead_code)]
    pub fn run(&self, args: &[&str]) -> std::io::Result<std::process::Output> {
        Command::new(&self.cli_binary)
            .args(args)
            .current_dir(self.path())
            .env("NO_COLOR", "1")
            .env("HOME", &self.home_dir)
            .env("XDG_CONFIG_HOME", self.home_dir.join(".config"))
            .env_remove("DATREE_VALIDATOR_LOG")
            .output()
    }
}

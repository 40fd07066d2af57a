#![allow(dead_code)]

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    process::{Command, Output},
    sync::{Mutex, OnceLock},
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use validator_pipeline::app_dirs::CONFIG_HOME_ENV;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Points the application directory at `path` for the lifetime of the guard.
pub struct ConfigHomeGuard {
    previous: Option<String>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

impl ConfigHomeGuard {
    pub fn set(path: &Path) -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let previous = std::env::var(CONFIG_HOME_ENV).ok();
        // SAFETY: tests run under a global lock to prevent concurrent env mutations.
        unsafe {
            std::env::set_var(CONFIG_HOME_ENV, path);
        }
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for ConfigHomeGuard {
    fn drop(&mut self) {
        // SAFETY: tests run under a global lock to prevent concurrent env mutations.
        unsafe {
            match self.previous.take() {
                Some(value) => std::env::set_var(CONFIG_HOME_ENV, value),
                None => std::env::remove_var(CONFIG_HOME_ENV),
            }
        }
    }
}

/// Run a tool with its application directory isolated under `home`.
pub fn run_tool(exe: &str, home: &Path, args: &[&str]) -> Output {
    Command::new(exe)
        .args(args)
        .env(CONFIG_HOME_ENV, home)
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn tool")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Two noisy features whose sum mostly decides the label.
pub fn write_training_csv(path: &Path, rows: usize, seed: u64) -> PathBuf {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut text = String::from("f0,f1,label\n");
    for i in 0..rows {
        let f0: f32 = rng.random_range(0.0..1.0);
        let f1: f32 = rng.random_range(0.0..1.0);
        let noisy = rng.random_range(0.0..1.0) < 0.1;
        let label = u8::from((f0 + f1 > 1.0) != noisy);
        // Keep both classes present regardless of the draw.
        let label = match i {
            0 => 0,
            1 => 1,
            _ => label,
        };
        writeln!(text, "{f0},{f1},{label}").expect("format row");
    }
    std::fs::write(path, text).expect("write csv");
    path.to_path_buf()
}

/// Feature-only CSV with the given columns.
pub fn write_feature_csv(path: &Path, columns: &[&str], rows: &[Vec<f32>]) -> PathBuf {
    let mut text = columns.join(",");
    text.push('\n');
    for row in rows {
        let values: Vec<String> = row.iter().map(|value| value.to_string()).collect();
        text.push_str(&values.join(","));
        text.push('\n');
    }
    std::fs::write(path, text).expect("write csv");
    path.to_path_buf()
}

/// Parse the bracketed list printed by `validator-eval`.
pub fn parse_scores(line: &str) -> (String, Vec<f64>) {
    let (label, rest) = line.trim().split_once(": ").expect("label separator");
    let inner = rest
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .expect("bracketed list");
    let values = inner
        .split(", ")
        .filter(|value| !value.is_empty())
        .map(|value| value.parse().expect("numeric score"))
        .collect();
    (label.to_string(), values)
}

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

const DEFAULT_TARGET: &str = "target.json";

/// Server the sample talks to, and the file it uploads.
#[derive(Debug, Deserialize)]
pub struct Target {
    base_url: String,
    #[serde(default = "default_sample_path")]
    sample_path: String,
    #[serde(default = "default_echo_path")]
    echo_path: String,
    #[serde(default = "default_upload_path")]
    upload_path: String,
    pub upload_file: PathBuf,
}

fn default_sample_path() -> String {
    "/notes/1".to_string()
}

fn default_echo_path() -> String {
    "/echo".to_string()
}

fn default_upload_path() -> String {
    "/files".to_string()
}

impl Target {
    pub fn sample_url(&self) -> String {
        self.join(&self.sample_path)
    }

    pub fn echo_url(&self) -> String {
        self.join(&self.echo_path)
    }

    pub fn upload_url(&self) -> String {
        self.join(&self.upload_path)
    }

    fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Load the target named on the command line, falling back to
/// `target.json` in the working directory.
pub fn load_target() -> Result<Target, String> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET));
    read_target(&path)
}

fn read_target(path: &Path) -> Result<Target, String> {
    let file =
        File::open(path).map_err(|e| format!("Cannot open target {}: {e}", path.display()))?;
    let target: Target = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Invalid target {}: {e}", path.display()))?;
    if !target.base_url.starts_with("http://") && !target.base_url.starts_with("https://") {
        return Err(format!("base_url must be an http(s) URL, got {}", target.base_url));
    }
    Ok(target)
}

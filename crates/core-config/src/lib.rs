//! Configuration loading and parsing.
//!
//! Parses `hallchat.toml` (or an override path provided by the binary):
//!
//! ```toml
//! [server]
//! base_url = "https://api.grimora.ai"
//! timeout_secs = 30
//! token = "..."            # HALLCHAT_TOKEN overrides
//!
//! [chat]
//! room = "the-hall"
//! poll_interval_ms = 3000
//! page_size = 50
//! anim_interval_ms = 80
//! status_ttl_ms = 4000
//! ```
//!
//! Every field has a default. A missing file or a parse error falls back to
//! defaults; unknown keys are ignored so the file can evolve ahead of the
//! binary. Out-of-range values are clamped in `Config::sanitize` and logged.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};
use tracing::info;

pub const TOKEN_ENV: &str = "HALLCHAT_TOKEN";
const CONFIG_FILE: &str = "hallchat.toml";

const MIN_POLL_INTERVAL_MS: u64 = 500;
const MAX_PAGE_SIZE: usize = 200;
const MIN_ANIM_INTERVAL_MS: u64 = 16;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ServerConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_secs: Self::default_timeout_secs(),
            token: None,
        }
    }
}

impl ServerConfig {
    fn default_base_url() -> String {
        "https://api.grimora.ai".to_string()
    }
    const fn default_timeout_secs() -> u64 {
        30
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    #[serde(default = "ChatConfig::default_room")]
    pub room: String,
    #[serde(default = "ChatConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "ChatConfig::default_page_size")]
    pub page_size: usize,
    #[serde(default = "ChatConfig::default_anim_interval_ms")]
    pub anim_interval_ms: u64,
    #[serde(default = "ChatConfig::default_status_ttl_ms")]
    pub status_ttl_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            room: Self::default_room(),
            poll_interval_ms: Self::default_poll_interval_ms(),
            page_size: Self::default_page_size(),
            anim_interval_ms: Self::default_anim_interval_ms(),
            status_ttl_ms: Self::default_status_ttl_ms(),
        }
    }
}

impl ChatConfig {
    fn default_room() -> String {
        "the-hall".to_string()
    }
    const fn default_poll_interval_ms() -> u64 {
        3000
    }
    const fn default_page_size() -> usize {
        50
    }
    const fn default_anim_interval_ms() -> u64 {
        80
    }
    const fn default_status_ttl_ms() -> u64 {
        4000
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub source: Option<PathBuf>,
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("hallchat").join(CONFIG_FILE);
    }
    PathBuf::from(CONFIG_FILE)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_file_missing_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            let mut cfg = Config {
                raw: Some(content),
                file,
                source: Some(path),
            };
            cfg.sanitize();
            Ok(cfg)
        }
        Err(e) => {
            info!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Clamp values the runtime cannot honor. Returns true when anything changed.
    pub fn sanitize(&mut self) -> bool {
        let chat = &mut self.file.chat;
        let mut changed = false;

        if chat.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            info!(target: "config", raw = chat.poll_interval_ms, clamped = MIN_POLL_INTERVAL_MS, "chat_poll_interval_clamped");
            chat.poll_interval_ms = MIN_POLL_INTERVAL_MS;
            changed = true;
        }
        let page = chat.page_size.clamp(1, MAX_PAGE_SIZE);
        if page != chat.page_size {
            info!(target: "config", raw = chat.page_size, clamped = page, "chat_page_size_clamped");
            chat.page_size = page;
            changed = true;
        }
        if chat.anim_interval_ms < MIN_ANIM_INTERVAL_MS {
            info!(target: "config", raw = chat.anim_interval_ms, clamped = MIN_ANIM_INTERVAL_MS, "chat_anim_interval_clamped");
            chat.anim_interval_ms = MIN_ANIM_INTERVAL_MS;
            changed = true;
        }
        if chat.room.trim().is_empty() {
            chat.room = ChatConfig::default_room();
            changed = true;
        }
        changed
    }

    /// Apply command-line overrides on top of the file values.
    pub fn apply_overrides(&mut self, room: Option<String>, base_url: Option<String>) {
        if let Some(room) = room.filter(|r| !r.trim().is_empty()) {
            self.file.chat.room = room;
        }
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.file.server.base_url = url;
        }
    }

    /// Bearer token: the environment wins over the file.
    pub fn token(&self) -> Option<String> {
        self.token_with_env(std::env::var(TOKEN_ENV).ok())
    }

    fn token_with_env(&self, env: Option<String>) -> Option<String> {
        env.or_else(|| self.file.server.token.clone())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.file.chat.poll_interval_ms)
    }

    pub fn anim_interval(&self) -> Duration {
        Duration::from_millis(self.file.chat.anim_interval_ms)
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_millis(self.file.chat.status_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.file.server.timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), body).unwrap();
        tmp
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.file.chat.room, "the-hall");
        assert_eq!(cfg.poll_interval(), Duration::from_secs(3));
        assert_eq!(cfg.file.chat.page_size, 50);
        assert_eq!(cfg.anim_interval(), Duration::from_millis(80));
        assert_eq!(cfg.file.server.base_url, "https://api.grimora.ai");
        assert!(cfg.source.is_none());
    }

    #[test]
    fn parses_partial_sections() {
        let tmp = write_config("[chat]\nroom = \"guild-nyx\"\npage_size = 20\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.chat.room, "guild-nyx");
        assert_eq!(cfg.file.chat.page_size, 20);
        assert_eq!(cfg.file.chat.poll_interval_ms, 3000);
        assert_eq!(cfg.file.server.timeout_secs, 30);
        assert_eq!(cfg.source.as_deref(), Some(tmp.path()));
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let tmp = write_config("[chat\nroom = ");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file, ConfigFile::default());
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let tmp = write_config("[chat]\nroom = \"x\"\nfuture_knob = true\n[theme]\nname = \"dark\"\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.chat.room, "x");
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let tmp = write_config("[chat]\npoll_interval_ms = 10\npage_size = 5000\nanim_interval_ms = 0\nroom = \"  \"\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.chat.poll_interval_ms, 500);
        assert_eq!(cfg.file.chat.page_size, 200);
        assert_eq!(cfg.file.chat.anim_interval_ms, 16);
        assert_eq!(cfg.file.chat.room, "the-hall");
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let mut cfg = Config::default();
        cfg.file.chat.page_size = 0;
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        with_default(subscriber, || {
            assert!(cfg.sanitize());
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("chat_page_size_clamped"));
        assert_eq!(cfg.file.chat.page_size, 1);
    }

    #[test]
    fn env_token_overrides_file_token() {
        let tmp = write_config("[server]\ntoken = \"from-file\"\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.token_with_env(None).as_deref(), Some("from-file"));
        assert_eq!(
            cfg.token_with_env(Some("from-env".into())).as_deref(),
            Some("from-env")
        );
        assert_eq!(cfg.token_with_env(Some("  ".into())), None);
    }

    #[test]
    fn cli_overrides_win() {
        let mut cfg = Config::default();
        cfg.apply_overrides(Some("lobby".into()), Some("http://localhost:8080".into()));
        assert_eq!(cfg.file.chat.room, "lobby");
        assert_eq!(cfg.file.server.base_url, "http://localhost:8080");
        cfg.apply_overrides(Some("".into()), None);
        assert_eq!(cfg.file.chat.room, "lobby");
    }
}

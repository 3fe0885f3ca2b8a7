//! Catalogue extraction types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Text color the catalogue renders for currently valid rows and cells.
/// Superseded entries are greyed out and must never be returned.
pub const ACTIVE_TEXT_COLOR: &str = "#212529";

/// Desktop user agent applied to every request page before navigation.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Catalogue scraper settings.
#[derive(Debug, Clone)]
pub struct EtkaConfig {
    /// Catalogue entry page.
    pub base_url: String,
    /// Catalogue account name.
    pub username: String,
    /// Catalogue account password.
    pub password: String,
    /// Headless mode.
    pub headless: bool,
    /// Debug mode (base64 screenshot logging, verbose browser logs).
    pub debug: bool,
    /// Directory holding one persistent browser profile per scraper identity.
    pub profile_root: PathBuf,
    /// Directory for failure snapshots.
    pub snapshot_dir: PathBuf,
    /// Menu position to click when no air-conditioning label matches.
    /// `None` disables the positional fallback.
    pub category_fallback_index: Option<usize>,
    /// User agent override for request pages.
    pub user_agent: String,
}

impl Default for EtkaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://superetka.com/etka".to_string(),
            username: String::new(),
            password: String::new(),
            headless: true,
            debug: false,
            profile_root: std::env::temp_dir(),
            snapshot_dir: PathBuf::from("/tmp"),
            category_fallback_index: Some(8),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl EtkaConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Credentials from `ETKA_USER` / `ETKA_PASS`.
    pub fn from_env() -> Self {
        Self {
            username: std::env::var("ETKA_USER").unwrap_or_default(),
            password: std::env::var("ETKA_PASS").unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_profile_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.profile_root = root.into();
        self
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    pub fn with_category_fallback(mut self, index: Option<usize>) -> Self {
        self.category_fallback_index = index;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// One cell of the part details table, as collected in-page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailCell {
    /// Trimmed cell text.
    #[serde(default)]
    pub text: String,
    /// `num` attribute, present on part-number cells.
    #[serde(default)]
    pub num: Option<String>,
    /// `numn` attribute (secondary number).
    #[serde(default)]
    pub numn: Option<String>,
    /// `title` attribute.
    #[serde(default)]
    pub title: Option<String>,
    /// Computed text color as `#rrggbb`.
    #[serde(default)]
    pub color: String,
}

impl DetailCell {
    pub fn is_active(&self) -> bool {
        self.color == ACTIVE_TEXT_COLOR
    }
}

/// One row of the sub-group listing table, as collected in-page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRow {
    /// Position in the listing table.
    pub index: usize,
    /// Trimmed row text.
    #[serde(default)]
    pub text: String,
    /// Computed text colors of the row's cells.
    #[serde(default)]
    pub colors: Vec<String>,
}

impl CandidateRow {
    pub fn is_active(&self) -> bool {
        self.colors.iter().any(|c| c == ACTIVE_TEXT_COLOR)
    }
}

/// The resolved part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    /// Primary part number.
    pub num: String,
    /// Secondary part number, when the catalogue carries one.
    pub numn: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// Raw cell text the number was taken from.
    pub text: String,
}

impl PartRecord {
    /// Record carrying only a number, as helper scripts usually emit.
    pub fn from_number(num: impl Into<String>) -> Self {
        let num = num.into();
        Self {
            text: num.clone(),
            num,
            numn: None,
            title: None,
        }
    }
}

/// Key/value details scraped from the vehicle summary table.
/// Keys are normalized to lowercase with underscores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleInfo(BTreeMap<String, String>);

impl VehicleInfo {
    /// Build from raw key/value pairs, dropping pairs whose key normalizes to nothing.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut map = BTreeMap::new();
        for (key, value) in pairs {
            let key = normalize_key(&key);
            if !key.is_empty() {
                map.insert(key, value);
            }
        }
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

/// Canonical form for vehicle summary keys: lowercase, whitespace runs
/// become underscores, everything else outside `[a-z0-9_]` is dropped.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

//! Pipeline configuration (snapshell.toml).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use snapshell_static::{FontSpec, ShellOptions};

/// Configuration file structure (snapshell.toml).
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    build: BuildSection,
    #[serde(default)]
    page: PageSection,
    #[serde(default)]
    assets: AssetsSection,
    #[serde(default)]
    fonts: Vec<FontSection>,
    #[serde(default)]
    package: PackageSection,
    #[serde(default)]
    capture: CaptureSection,
}

#[derive(Debug, Deserialize)]
struct BuildSection {
    #[serde(default = "default_dist")]
    dist: String,
    #[serde(default = "default_graph")]
    graph: String,
    #[serde(default = "default_shell_template")]
    shell_template: String,
    #[serde(default = "default_headers_template")]
    headers_template: String,
}

#[derive(Debug, Deserialize)]
struct PageSection {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    theme_color: String,
    #[serde(default)]
    url: String,
    #[serde(default = "default_locale")]
    locale: String,
    #[serde(default)]
    twitter_account: String,
    #[serde(default = "default_social_image")]
    image: String,
    #[serde(default)]
    image_alt: String,
    #[serde(default)]
    image_width: String,
    #[serde(default)]
    image_height: String,
    #[serde(default)]
    image_type: String,
}

#[derive(Debug, Deserialize)]
struct AssetsSection {
    #[serde(default = "default_bootstrap")]
    bootstrap: String,
    #[serde(default = "default_worker")]
    worker: String,
    #[serde(default = "default_favicon")]
    favicon: String,
    #[serde(default = "default_icon")]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct FontSection {
    asset: String,
    weight: u32,
    inline_file: String,
    #[serde(default)]
    inline_characters: String,
}

#[derive(Debug, Deserialize, Default)]
struct PackageSection {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
struct CaptureSection {
    #[serde(default = "default_viewport_width")]
    viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    viewport_height: u32,
    #[serde(default = "default_settle_ms")]
    settle_ms: u64,
}

fn default_dist() -> String {
    "dist".to_string()
}
fn default_graph() -> String {
    "dependencygraph.json".to_string()
}
fn default_shell_template() -> String {
    "src/index.html.j2".to_string()
}
fn default_headers_template() -> String {
    "src/_headers.j2".to_string()
}
fn default_locale() -> String {
    "en_US".to_string()
}
fn default_social_image() -> String {
    "social-cover.jpg".to_string()
}
fn default_bootstrap() -> String {
    "bootstrap.tsx".to_string()
}
fn default_worker() -> String {
    "worker.ts".to_string()
}
fn default_favicon() -> String {
    "favicon.png".to_string()
}
fn default_icon() -> String {
    "icon-maskable.png".to_string()
}
fn default_viewport_width() -> u32 {
    1280
}
fn default_viewport_height() -> u32 {
    720
}
fn default_settle_ms() -> u64 {
    1000
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            dist: default_dist(),
            graph: default_graph(),
            shell_template: default_shell_template(),
            headers_template: default_headers_template(),
        }
    }
}

impl Default for PageSection {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            theme_color: String::new(),
            url: String::new(),
            locale: default_locale(),
            twitter_account: String::new(),
            image: default_social_image(),
            image_alt: String::new(),
            image_width: String::new(),
            image_height: String::new(),
            image_type: String::new(),
        }
    }
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            bootstrap: default_bootstrap(),
            worker: default_worker(),
            favicon: default_favicon(),
            icon: default_icon(),
        }
    }
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            settle_ms: default_settle_ms(),
        }
    }
}

/// Resolved configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub dist_dir: PathBuf,
    pub graph_path: PathBuf,
    pub shell_template: PathBuf,
    pub headers_template: PathBuf,
    pub shell: ShellOptions,
    pub viewport: (u32, u32),
    pub settle: Duration,
}

impl RenderConfig {
    /// Load configuration from `path` if it exists, falling back to
    /// defaults. Returns an error if the file exists but is malformed.
    pub fn load(path: &Path, dist_override: Option<PathBuf>) -> Result<Self> {
        let file = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
            let config: ConfigFile = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
            tracing::info!("Loaded config from {}", path.display());
            config
        } else {
            ConfigFile::default()
        };

        let shell = ShellOptions {
            bootstrap_module: file.assets.bootstrap,
            worker_module: file.assets.worker,
            fonts: file
                .fonts
                .into_iter()
                .map(|f| FontSpec {
                    asset: f.asset,
                    weight: f.weight,
                    inline_file: PathBuf::from(f.inline_file),
                    inline_characters: f.inline_characters,
                })
                .collect(),
            theme_color: file.page.theme_color,
            favicon: file.assets.favicon,
            icon: file.assets.icon,
            social_image: file.page.image,
            title: file.page.title,
            description: file.page.description,
            image_alt: file.page.image_alt,
            image_width: file.page.image_width,
            image_height: file.page.image_height,
            image_type: file.page.image_type,
            twitter_account: file.page.twitter_account,
            url: file.page.url,
            locale: file.page.locale,
            package_name: file.package.name,
            package_version: file.package.version,
        };

        Ok(Self {
            dist_dir: dist_override.unwrap_or_else(|| PathBuf::from(&file.build.dist)),
            graph_path: PathBuf::from(file.build.graph),
            shell_template: PathBuf::from(file.build.shell_template),
            headers_template: PathBuf::from(file.build.headers_template),
            shell,
            viewport: (file.capture.viewport_width, file.capture.viewport_height),
            settle: Duration::from_millis(file.capture.settle_ms),
        })
    }

    /// The page the shell is rendered to and the corrected markup persisted
    /// over.
    pub fn index_path(&self) -> PathBuf {
        self.dist_dir.join("index.html")
    }

    /// The auxiliary response-headers artifact.
    pub fn headers_path(&self) -> PathBuf {
        self.dist_dir.join("_headers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let temp = tempfile::tempdir().unwrap();

        let config = RenderConfig::load(&temp.path().join("snapshell.toml"), None).unwrap();

        assert_eq!(config.dist_dir, PathBuf::from("dist"));
        assert_eq!(config.shell.bootstrap_module, "bootstrap.tsx");
        assert_eq!(config.viewport, (1280, 720));
        assert_eq!(config.settle, Duration::from_millis(1000));
    }

    #[test]
    fn parses_fonts_and_page_metadata() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("snapshell.toml");
        fs::write(
            &path,
            r#"
[build]
dist = "out"

[page]
title = "A game"
url = "https://example.app/"

[[fonts]]
asset = "mono-regular.woff2"
weight = 400
inline_file = "src/assets/mono-inline.woff2"
inline_characters = "0123456789"

[capture]
settle_ms = 250
"#,
        )
        .unwrap();

        let config = RenderConfig::load(&path, None).unwrap();

        assert_eq!(config.dist_dir, PathBuf::from("out"));
        assert_eq!(config.shell.title, "A game");
        assert_eq!(config.shell.fonts.len(), 1);
        assert_eq!(config.shell.fonts[0].weight, 400);
        assert_eq!(config.settle, Duration::from_millis(250));
    }

    #[test]
    fn dist_override_wins_over_config() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("snapshell.toml");
        fs::write(&path, "[build]\ndist = \"out\"\n").unwrap();

        let config = RenderConfig::load(&path, Some(PathBuf::from("elsewhere"))).unwrap();

        assert_eq!(config.dist_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.index_path(), PathBuf::from("elsewhere/index.html"));
        assert_eq!(config.headers_path(), PathBuf::from("elsewhere/_headers"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("snapshell.toml");
        fs::write(&path, "[build\n").unwrap();

        assert!(RenderConfig::load(&path, None).is_err());
    }
}

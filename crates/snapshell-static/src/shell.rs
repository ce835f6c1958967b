//! HTML shell rendering.
//!
//! Builds the full template context from resolved asset references and
//! inlined font subsets, then renders the shell (and the auxiliary headers
//! artifact) with minijinja.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use minijinja::Environment;
use serde::Serialize;

use crate::charset::CharacterSet;
use crate::graph::{AssetGraph, GraphError};

/// Errors that can occur building the context or rendering templates.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Asset resolution failed: {0}")]
    Graph(#[from] GraphError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render template: {0}")]
    Template(#[from] minijinja::Error),
}

/// One web font as the shell template consumes it: the hosted hashed file
/// plus the inlined, trimmed subset and the characters that subset covers.
#[derive(Debug, Clone, Serialize)]
pub struct FontDescriptor {
    /// Resolved content-hashed filename of the full font.
    pub asset: String,
    /// CSS font weight.
    pub weight: u32,
    /// Base64-encoded trimmed subset payload, inlined into the shell.
    pub inline: String,
    /// `unicode-range` value covered by the inlined subset.
    pub inline_range: String,
}

/// Where to find a font and what its inlined subset covers.
#[derive(Debug, Clone)]
pub struct FontSpec {
    /// Logical asset name of the hosted font, e.g. `"mono-regular.woff2"`.
    pub asset: String,
    pub weight: u32,
    /// Pre-trimmed subset file to inline.
    pub inline_file: PathBuf,
    /// Characters the inlined subset covers.
    pub inline_characters: String,
}

impl FontSpec {
    /// Resolve the hosted filename and read + encode the inline subset.
    pub fn load(&self, graph: &AssetGraph) -> Result<FontDescriptor, ShellError> {
        let asset = graph.asset_by_logical_name(&self.asset)?.file_name().to_string();

        let payload = fs::read(&self.inline_file).map_err(|source| ShellError::Io {
            path: self.inline_file.clone(),
            source,
        })?;

        Ok(FontDescriptor {
            asset,
            weight: self.weight,
            inline: BASE64.encode(payload),
            inline_range: CharacterSet::from_text(&self.inline_characters).to_hex_range_string(),
        })
    }
}

/// Everything the shell template needs, before asset resolution.
#[derive(Debug, Clone)]
pub struct ShellOptions {
    /// Source module suffix of the bootstrap chunk, e.g. `"bootstrap.tsx"`.
    pub bootstrap_module: String,
    /// Source module suffix of the worker chunk, e.g. `"worker.ts"`.
    pub worker_module: String,
    pub fonts: Vec<FontSpec>,
    pub theme_color: String,
    /// Logical asset names.
    pub favicon: String,
    pub icon: String,
    pub social_image: String,
    /// Page metadata.
    pub title: String,
    pub description: String,
    pub image_alt: String,
    pub image_width: String,
    pub image_height: String,
    pub image_type: String,
    pub twitter_account: String,
    /// Canonical URL of the deployed page, used as the social image base.
    pub url: String,
    pub locale: String,
    pub package_name: String,
    pub package_version: String,
}

/// Package metadata exposed to the template.
#[derive(Debug, Clone, Serialize)]
pub struct PackageMeta {
    pub name: String,
    pub version: String,
}

/// The fully resolved template context. Constructed once, consumed once.
#[derive(Debug, Clone, Serialize)]
pub struct ShellContext {
    pub bootstrap_file: String,
    pub worker_file: String,
    pub fonts: Vec<FontDescriptor>,
    pub theme_color: String,
    pub favicon: String,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub image_alt: String,
    pub image_width: String,
    pub image_height: String,
    pub image_type: String,
    pub twitter_account: String,
    pub url: String,
    pub locale: String,
    pub pkg: PackageMeta,
}

impl ShellContext {
    /// Resolve every asset the shell references.
    ///
    /// Any entry missing from the graph is a build-consistency error and
    /// aborts immediately; the shell is never rendered with an empty
    /// reference.
    pub fn build(graph: &AssetGraph, opts: &ShellOptions) -> Result<Self, ShellError> {
        let bootstrap_file = graph
            .chunk_by_module_suffix(&opts.bootstrap_module)?
            .file_name()
            .to_string();
        let worker_file = graph
            .chunk_by_module_suffix(&opts.worker_module)?
            .file_name()
            .to_string();

        let fonts = opts
            .fonts
            .iter()
            .map(|spec| spec.load(graph))
            .collect::<Result<Vec<_>, _>>()?;

        let favicon = graph.asset_by_logical_name(&opts.favicon)?.file_name().to_string();
        let icon = graph.asset_by_logical_name(&opts.icon)?.file_name().to_string();
        let social_image = graph
            .asset_by_logical_name(&opts.social_image)?
            .file_name()
            .to_string();

        let image_url = format!("{}/{}", opts.url.trim_end_matches('/'), social_image);

        Ok(Self {
            bootstrap_file,
            worker_file,
            fonts,
            theme_color: opts.theme_color.clone(),
            favicon,
            icon,
            title: opts.title.clone(),
            description: opts.description.clone(),
            image_url,
            image_alt: opts.image_alt.clone(),
            image_width: opts.image_width.clone(),
            image_height: opts.image_height.clone(),
            image_type: opts.image_type.clone(),
            twitter_account: opts.twitter_account.clone(),
            url: opts.url.clone(),
            locale: opts.locale.clone(),
            pkg: PackageMeta {
                name: opts.package_name.clone(),
                version: opts.package_version.clone(),
            },
        })
    }
}

/// Render `template_path` against `context` and write the result to
/// `output_path`, overwriting any existing file.
pub fn render_template<S: Serialize>(
    template_path: &Path,
    output_path: &Path,
    context: &S,
) -> Result<(), ShellError> {
    let source = fs::read_to_string(template_path).map_err(|source| ShellError::Io {
        path: template_path.to_path_buf(),
        source,
    })?;

    let mut env = Environment::new();
    env.add_template("page", &source)?;
    let rendered = env
        .get_template("page")?
        .render(minijinja::Value::from_serialize(context))?;

    fs::write(output_path, rendered).map_err(|source| ShellError::Io {
        path: output_path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Rendered {} to {}", template_path.display(), output_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn options() -> ShellOptions {
        ShellOptions {
            bootstrap_module: "bootstrap.tsx".to_string(),
            worker_module: "worker.ts".to_string(),
            fonts: vec![],
            theme_color: "#0a0a23".to_string(),
            favicon: "favicon.png".to_string(),
            icon: "icon-maskable.png".to_string(),
            social_image: "social-cover.jpg".to_string(),
            title: "A game".to_string(),
            description: "A description".to_string(),
            image_alt: "Game screen".to_string(),
            image_width: "1200".to_string(),
            image_height: "675".to_string(),
            image_type: "image/jpeg".to_string(),
            twitter_account: "@example".to_string(),
            url: "https://example.app/".to_string(),
            locale: "en_US".to_string(),
            package_name: "example".to_string(),
            package_version: "1.0.0".to_string(),
        }
    }

    fn full_graph() -> AssetGraph {
        AssetGraph::from_json_str(
            r#"{
                "1": {"isChunk": true, "fileName": "bootstrap-ab12.js", "facadeModuleId": "src/bootstrap.tsx"},
                "2": {"isChunk": true, "fileName": "worker-cd34.js", "facadeModuleId": "src/worker.ts"},
                "3": {"isAsset": true, "fileName": "favicon-ff00.png"},
                "4": {"isAsset": true, "fileName": "icon-maskable-11aa.png"},
                "5": {"isAsset": true, "fileName": "social-cover-22bb.jpg"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn builds_context_with_resolved_references() {
        let ctx = ShellContext::build(&full_graph(), &options()).unwrap();

        assert_eq!(ctx.bootstrap_file, "bootstrap-ab12.js");
        assert_eq!(ctx.worker_file, "worker-cd34.js");
        assert_eq!(ctx.favicon, "favicon-ff00.png");
        assert_eq!(ctx.icon, "icon-maskable-11aa.png");
        assert_eq!(ctx.image_url, "https://example.app/social-cover-22bb.jpg");
    }

    #[test]
    fn fails_fast_when_a_chunk_is_absent() {
        let graph = AssetGraph::from_json_str(
            r#"{"3": {"isAsset": true, "fileName": "favicon-ff00.png"}}"#,
        )
        .unwrap();

        let err = ShellContext::build(&graph, &options()).unwrap_err();
        assert!(matches!(
            err,
            ShellError::Graph(GraphError::ChunkNotFound { suffix }) if suffix == "bootstrap.tsx"
        ));
    }

    #[test]
    fn fails_fast_when_an_asset_is_absent() {
        let graph = AssetGraph::from_json_str(
            r#"{
                "1": {"isChunk": true, "fileName": "bootstrap-ab12.js", "facadeModuleId": "src/bootstrap.tsx"},
                "2": {"isChunk": true, "fileName": "worker-cd34.js", "facadeModuleId": "src/worker.ts"}
            }"#,
        )
        .unwrap();

        let err = ShellContext::build(&graph, &options()).unwrap_err();
        assert!(matches!(
            err,
            ShellError::Graph(GraphError::AssetNotFound { name }) if name == "favicon.png"
        ));
    }

    #[test]
    fn loads_font_with_inline_payload_and_range() {
        let temp = tempdir().unwrap();
        let subset = temp.path().join("mono-inline.woff2");
        fs::write(&subset, b"woff2data").unwrap();

        let graph = AssetGraph::from_json_str(
            r#"{"1": {"isAsset": true, "fileName": "mono-regular-99fe.woff2"}}"#,
        )
        .unwrap();

        let spec = FontSpec {
            asset: "mono-regular.woff2".to_string(),
            weight: 400,
            inline_file: subset,
            inline_characters: "START ".to_string(),
        };

        let font = spec.load(&graph).unwrap();
        assert_eq!(font.asset, "mono-regular-99fe.woff2");
        assert_eq!(font.weight, 400);
        assert_eq!(font.inline, BASE64.encode(b"woff2data"));
        // S, T, A, R, space collapse into sorted, merged ranges.
        assert_eq!(font.inline_range, "U+20,U+41,U+52-54");
    }

    #[test]
    fn renders_template_and_embeds_resolved_names() {
        let temp = tempdir().unwrap();
        let template = temp.path().join("index.html.j2");
        let output = temp.path().join("index.html");
        fs::write(
            &template,
            "<script src=\"./{{ bootstrap_file }}\"></script><link rel=\"icon\" href=\"./{{ favicon }}\">",
        )
        .unwrap();

        let ctx = ShellContext::build(&full_graph(), &options()).unwrap();
        render_template(&template, &output, &ctx).unwrap();

        let html = fs::read_to_string(&output).unwrap();
        assert!(html.contains("bootstrap-ab12.js"));
        assert!(html.contains("favicon-ff00.png"));
    }

    #[test]
    fn render_fails_on_missing_template() {
        let temp = tempdir().unwrap();
        let err = render_template(
            &temp.path().join("nope.j2"),
            &temp.path().join("out.html"),
            &(),
        )
        .unwrap_err();

        assert!(matches!(err, ShellError::Io { .. }));
    }

    #[test]
    fn render_overwrites_existing_output() {
        let temp = tempdir().unwrap();
        let template = temp.path().join("t.j2");
        let output = temp.path().join("out.html");
        fs::write(&template, "new content").unwrap();
        fs::write(&output, "old content").unwrap();

        render_template(&template, &output, &()).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "new content");
    }
}

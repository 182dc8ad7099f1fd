//! Prompt loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Loads and renders prompt templates
///
/// Lookup order for a template `name`:
/// 1. User override: `.rfpdraft/prompts/{name}.pmt`
/// 2. Repo default: `prompts/{name}.pmt`
/// 3. Embedded fallback
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    user_dir: Option<PathBuf>,
    repo_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at the given directory
    pub fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let user_dir = base.join(".rfpdraft/prompts");
        let repo_dir = base.join("prompts");

        debug!(
            user_dir_exists = user_dir.exists(),
            repo_dir_exists = repo_dir.exists(),
            "PromptLoader::new: checking directories"
        );

        Self {
            hbs: Handlebars::new(),
            user_dir: user_dir.exists().then_some(user_dir),
            repo_dir: repo_dir.exists().then_some(repo_dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self {
            hbs: Handlebars::new(),
            user_dir: None,
            repo_dir: None,
        }
    }

    /// Load a template by name through the override chain
    fn load_template(&self, name: &str) -> Result<String> {
        for dir in [&self.user_dir, &self.repo_dir].into_iter().flatten() {
            let path = dir.join(format!("{name}.pmt"));
            if path.exists() {
                debug!(?path, "load_template: found on disk");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "load_template: using embedded");
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "render: called");
        let template = self.load_template(template_name)?;

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Ctx {
        request: String,
        context: String,
        purpose_analysis: Option<String>,
    }

    #[test]
    fn test_render_embedded_purpose() {
        let loader = PromptLoader::embedded_only();
        let ctx = Ctx {
            request: "의료 정보 시스템 보안 강화 프로젝트".to_string(),
            context: String::new(),
            purpose_analysis: None,
        };

        let rendered = loader.render("purpose", &ctx).unwrap();
        assert!(rendered.contains("의료 정보 시스템 보안 강화 프로젝트"));
        assert!(rendered.contains("core_purpose"));
    }

    #[test]
    fn test_render_does_not_escape_content() {
        let loader = PromptLoader::embedded_only();
        let ctx = Ctx {
            request: "a & b < c".to_string(),
            context: String::new(),
            purpose_analysis: None,
        };

        let rendered = loader.render("purpose", &ctx).unwrap();
        assert!(rendered.contains("a & b < c"));
    }

    #[test]
    fn test_unknown_template_errors() {
        let loader = PromptLoader::embedded_only();
        let ctx = Ctx {
            request: String::new(),
            context: String::new(),
            purpose_analysis: None,
        };
        assert!(loader.render("nonexistent-template", &ctx).is_err());
    }

    #[test]
    fn test_user_override_wins() {
        let temp = tempfile::TempDir::new().unwrap();
        let override_dir = temp.path().join(".rfpdraft/prompts");
        std::fs::create_dir_all(&override_dir).unwrap();
        std::fs::write(override_dir.join("purpose.pmt"), "OVERRIDE: {{{request}}}").unwrap();

        let loader = PromptLoader::new(temp.path());
        let ctx = Ctx {
            request: "hello".to_string(),
            context: String::new(),
            purpose_analysis: None,
        };

        let rendered = loader.render("purpose", &ctx).unwrap();
        assert_eq!(rendered, "OVERRIDE: hello");
    }
}

//! Reply templates for the toss result.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use minijinja::{Environment, UndefinedBehavior, context};
use rand::Rng;
use rand::seq::IndexedRandom;
use regex::Regex;

use crate::error::ExitError;

pub const BUILTIN_REPLIES: &str = include_str!("templates/replies.json");

static NAME_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{-?\s*name\s*-?\}\}").expect("placeholder pattern is valid")
});

/// Immutable collection of reply templates, each with exactly one
/// `{{ name }}` placeholder.
#[derive(Debug)]
pub struct ReplyBook {
    env: Environment<'static>,
    templates: Vec<String>,
}

impl ReplyBook {
    /// Validate and wrap a set of templates.
    pub fn new(templates: Vec<String>) -> anyhow::Result<Self> {
        if templates.is_empty() {
            return Err(ExitError::Config("reply template list is empty".into()).into());
        }

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        for (i, source) in templates.iter().enumerate() {
            let placeholders = NAME_PLACEHOLDER.find_iter(source).count();
            if placeholders != 1 {
                return Err(ExitError::Config(format!(
                    "reply template #{} must contain exactly one {{{{ name }}}} placeholder, found {placeholders}: {source:?}",
                    i + 1
                ))
                .into());
            }
            env.render_str(source, context! { name => "" }).map_err(|e| {
                ExitError::Config(format!("reply template #{} does not compile: {e}", i + 1))
            })?;
        }

        Ok(Self { env, templates })
    }

    /// The replies compiled into the binary.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(BUILTIN_REPLIES).context("loading built-in replies")
    }

    /// Parse a JSON array of template strings.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let templates: Vec<String> = serde_json::from_str(json)
            .map_err(|e| ExitError::Config(format!("invalid replies file: {e}")))?;
        Self::new(templates)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("loading replies from {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Pick a template uniformly at random and fill in the name.
    pub fn render_random<R: Rng + ?Sized>(
        &self,
        name: &str,
        rng: &mut R,
    ) -> Result<String, minijinja::Error> {
        // `new` rejects an empty list, so `choose` always yields a template.
        let source = self.templates.choose(rng).map_or("{{ name }}", String::as_str);
        self.env.render_str(source, context! { name => name })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn builtin_replies_are_valid() {
        let book = ReplyBook::builtin().unwrap();
        assert!(!book.is_empty());
    }

    #[test]
    fn renders_name_into_template() {
        let book = ReplyBook::new(vec!["{{ name }} pays!".into()]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(book.render_random("Ann", &mut rng).unwrap(), "Ann pays!");
    }

    #[test]
    fn names_are_not_html_escaped() {
        let book = ReplyBook::new(vec!["{{name}} pays".into()]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            book.render_random("Tom & <Jerry>", &mut rng).unwrap(),
            "Tom & <Jerry> pays"
        );
    }

    #[test]
    fn rejects_empty_list() {
        let err = ReplyBook::new(vec![]).unwrap_err();
        assert!(err.downcast_ref::<ExitError>().is_some());
    }

    #[test]
    fn rejects_missing_or_repeated_placeholder() {
        assert!(ReplyBook::new(vec!["nobody pays".into()]).is_err());
        assert!(ReplyBook::new(vec!["{{ name }} and {{ name }}".into()]).is_err());
    }

    #[test]
    fn rejects_unknown_variables() {
        let err = ReplyBook::new(vec!["{{ name }} and {{ other }}".into()]).unwrap_err();
        assert!(err.to_string().contains("does not compile"));
    }

    #[test]
    fn rejects_broken_syntax() {
        assert!(ReplyBook::new(vec!["{{ name }} {% if %}".into()]).is_err());
    }

    #[test]
    fn from_json_requires_string_array() {
        assert!(ReplyBook::from_json(r#"["{{ name }}!"]"#).is_ok());
        assert!(ReplyBook::from_json(r#"{"a": 1}"#).is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replies.json");
        std::fs::write(&path, r#"["{{ name }} pays", "over to you, {{ name }}"]"#).unwrap();
        let book = ReplyBook::load(&path).unwrap();
        assert_eq!(book.len(), 2);
    }
}

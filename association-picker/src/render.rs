//! Render templates for candidates and selected values
//!
//! A template is either a reference to a host-registered renderer (`@name`)
//! or the source of a one-argument JavaScript function run in the sandbox from
//! `association-picker-js`. Evaluation never fails from the caller's point of
//! view: any error is logged and replaced by the record's fallback text.

use std::collections::HashMap;
use std::sync::Arc;

use association_picker_config::RenderLimits;
use association_picker_fields::CollectionDef;
use association_picker_js::{JsSandbox, SandboxLimits};
use tracing::error;

use crate::error::{PickerError, Result};
use crate::record::Record;

/// Text shown when a record has none of the fallback fields.
pub const UNKNOWN_TEXT: &str = "Unknown";

/// Fields tried, in order, when generating a default template.
pub const DEFAULT_TEMPLATE_FIELDS: &[&str] = &["id", "name", "title", "nickname", "username"];

/// What a template renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderKind {
    /// A row in the candidate list.
    Item,
    /// A selected-value tag.
    Value,
}

impl RenderKind {
    /// Fields consulted, in order, for fallback text.
    pub fn fallback_fields(self) -> &'static [&'static str] {
        match self {
            Self::Item => &["name", "title", "label", "id"],
            Self::Value => &["name", "nickname", "username", "title", "label", "id"],
        }
    }

    /// Parameter name used in generated templates.
    pub fn param(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Value => "value",
        }
    }
}

/// Fallback text for `record`: the first present fallback field, or [`UNKNOWN_TEXT`].
pub fn fallback_text(kind: RenderKind, record: &Record) -> String {
    record
        .first_text(kind.fallback_fields())
        .unwrap_or_else(|| UNKNOWN_TEXT.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderTemplate {
    /// A renderer looked up by name in the [`RendererRegistry`].
    Named(String),
    /// JavaScript function source.
    Script(String),
}

impl RenderTemplate {
    /// `@name` selects a named renderer; anything else is script source.
    pub fn parse(source: &str) -> Self {
        match source.trim().strip_prefix('@') {
            Some(name) => Self::Named(name.trim().to_string()),
            None => Self::Script(source.to_string()),
        }
    }

    /// The template generated when none is configured.
    ///
    /// Shows the first of [`DEFAULT_TEMPLATE_FIELDS`] the collection has, else
    /// its first field. Without field metadata it renders a "No data" marker.
    pub fn default_for(kind: RenderKind, collection: Option<&CollectionDef>) -> Self {
        let param = kind.param();
        let field = collection.and_then(|c| {
            DEFAULT_TEMPLATE_FIELDS
                .iter()
                .find_map(|name| c.field(name))
                .or_else(|| c.named_fields().next())
        });

        let source = match field {
            None => format!("function({param}) {{ return '<span>No data</span>'; }}"),
            Some(field) => format!(
                "function({param}) {{ if (!{param}) return '<span>No data</span>'; \
                 var displayValue = {access} || ''; \
                 return '<span>' + String(displayValue) + '</span>'; }}",
                access = member_access(param, &field.name),
            ),
        };
        Self::Script(source)
    }
}

/// `obj.name` for plain identifiers, `obj["na-me"]` otherwise.
fn member_access(object: &str, name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain {
        format!("{object}.{name}")
    } else {
        let quoted = serde_json::Value::String(name.to_string()).to_string();
        format!("{object}[{quoted}]")
    }
}

/// A host-provided renderer. `None` means it cannot render the record.
pub type NamedRenderer = Arc<dyn Fn(&Record) -> Option<String> + Send + Sync>;

/// Lookup table of named renderers.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    renderers: HashMap<String, NamedRenderer>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        name: impl Into<String>,
        renderer: impl Fn(&Record) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.renderers.insert(name.into(), Arc::new(renderer));
        self
    }

    pub fn get(&self, name: &str) -> Option<&NamedRenderer> {
        self.renderers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.renderers.contains_key(name)
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.renderers.keys().collect();
        names.sort();
        f.debug_struct("RendererRegistry").field("names", &names).finish()
    }
}

/// Evaluates render templates against records.
///
/// Cloning shares the underlying sandbox worker.
#[derive(Clone)]
pub struct RenderTemplateEvaluator {
    sandbox: JsSandbox,
    registry: RendererRegistry,
}

impl RenderTemplateEvaluator {
    /// Spawn a sandbox with the given limits.
    pub fn new(limits: &RenderLimits) -> Result<Self> {
        let sandbox = JsSandbox::spawn(SandboxLimits {
            memory_limit_bytes: limits.memory_limit_bytes,
            max_stack_bytes: limits.max_stack_bytes,
            timeout: limits.timeout(),
        })?;
        Ok(Self {
            sandbox,
            registry: RendererRegistry::new(),
        })
    }

    pub fn with_registry(mut self, registry: RendererRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    /// Render `record`, falling back to its fallback text on any failure.
    pub async fn evaluate(&self, template: &RenderTemplate, record: &Record, kind: RenderKind) -> String {
        match self.render(template, record).await {
            Ok(markup) => markup,
            Err(e) => {
                error!(?kind, error = %e, "render template failed, using fallback text");
                fallback_text(kind, record)
            }
        }
    }

    /// Render without the fallback.
    pub async fn render(&self, template: &RenderTemplate, record: &Record) -> Result<String> {
        match template {
            RenderTemplate::Named(name) => {
                let renderer = self
                    .registry
                    .get(name)
                    .ok_or_else(|| PickerError::UnknownRenderer(name.clone()))?;
                renderer(record).ok_or_else(|| PickerError::RendererDeclined(name.clone()))
            }
            RenderTemplate::Script(source) => {
                Ok(self.sandbox.render(source, &record.to_value()).await?)
            }
        }
    }

    /// Report whether a template is usable, without rendering anything.
    pub async fn check(&self, template: &RenderTemplate) -> Result<()> {
        match template {
            RenderTemplate::Named(name) if self.registry.contains(name) => Ok(()),
            RenderTemplate::Named(name) => Err(PickerError::UnknownRenderer(name.clone())),
            RenderTemplate::Script(source) => Ok(self.sandbox.compile(source).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use association_picker_fields::FieldMeta;
    use association_picker_js::JsError;
    use serde_json::json;

    fn evaluator() -> RenderTemplateEvaluator {
        RenderTemplateEvaluator::new(&RenderLimits::default()).unwrap()
    }

    fn ann() -> Record {
        Record::from_value(json!({"id": 1, "name": "Ann"})).unwrap()
    }

    #[test]
    fn fallback_orders() {
        let r = Record::from_value(json!({"id": 5, "username": "ann_k", "title": "Dr"})).unwrap();
        assert_eq!(fallback_text(RenderKind::Item, &r), "Dr");
        assert_eq!(fallback_text(RenderKind::Value, &r), "ann_k");
        assert_eq!(fallback_text(RenderKind::Item, &Record::new()), UNKNOWN_TEXT);
    }

    #[test]
    fn parse_named_and_script_templates() {
        assert_eq!(RenderTemplate::parse(" @avatar "), RenderTemplate::Named("avatar".into()));
        let script = "function(item) { return item.name; }";
        assert_eq!(RenderTemplate::parse(script), RenderTemplate::Script(script.into()));
    }

    #[test]
    fn default_template_picks_priority_field() {
        let users = CollectionDef::new("users")
            .with_field(FieldMeta::typed("email", "string"))
            .with_field(FieldMeta::typed("nickname", "string"))
            .with_field(FieldMeta::typed("name", "string"));
        let RenderTemplate::Script(source) = RenderTemplate::default_for(RenderKind::Item, Some(&users))
        else {
            panic!("expected script");
        };
        assert_eq!(
            source,
            "function(item) { if (!item) return '<span>No data</span>'; \
             var displayValue = item.name || ''; \
             return '<span>' + String(displayValue) + '</span>'; }"
        );

        let tags = CollectionDef::new("tags").with_field(FieldMeta::new("display-name"));
        let RenderTemplate::Script(source) = RenderTemplate::default_for(RenderKind::Value, Some(&tags))
        else {
            panic!("expected script");
        };
        assert!(source.starts_with("function(value) {"));
        assert!(source.contains(r#"value["display-name"]"#));

        assert_eq!(
            RenderTemplate::default_for(RenderKind::Item, None),
            RenderTemplate::Script("function(item) { return '<span>No data</span>'; }".into())
        );
    }

    #[tokio::test]
    async fn evaluates_script_templates() {
        let html = evaluator()
            .evaluate(
                &RenderTemplate::parse("function(item) { return '<b>' + item.name + '</b>'; }"),
                &ann(),
                RenderKind::Item,
            )
            .await;
        assert_eq!(html, "<b>Ann</b>");
    }

    #[test_log::test(tokio::test)]
    async fn throwing_template_falls_back() {
        let html = evaluator()
            .evaluate(
                &RenderTemplate::parse("function(item){ return item.nonexistent.prop; }"),
                &ann(),
                RenderKind::Item,
            )
            .await;
        assert_eq!(html, "Ann");
    }

    #[tokio::test]
    async fn malformed_template_falls_back() {
        let evaluator = evaluator();
        let template = RenderTemplate::parse("function(item { ");
        let html = evaluator
            .evaluate(&template, &Record::new().with("nickname", "annie"), RenderKind::Value)
            .await;
        assert_eq!(html, "annie");
        assert!(matches!(
            evaluator.check(&template).await,
            Err(PickerError::Js(JsError::Compilation { .. }))
        ));
    }

    #[tokio::test]
    async fn default_templates_render() {
        let users = CollectionDef::new("users").with_field(FieldMeta::typed("name", "string"));
        let evaluator = evaluator();
        let template = RenderTemplate::default_for(RenderKind::Value, Some(&users));
        assert_eq!(
            evaluator.evaluate(&template, &ann(), RenderKind::Value).await,
            "<span>Ann</span>"
        );
        assert_eq!(
            evaluator
                .evaluate(&template, &Record::new().with("id", 2), RenderKind::Value)
                .await,
            "<span></span>"
        );
    }

    #[tokio::test]
    async fn named_renderers() {
        let registry = RendererRegistry::new()
            .register("upper", |r: &Record| r.first_text(&["name"]).map(|n| n.to_uppercase()));
        let evaluator = evaluator().with_registry(registry);

        let upper = RenderTemplate::parse("@upper");
        assert_eq!(evaluator.evaluate(&upper, &ann(), RenderKind::Item).await, "ANN");
        assert!(evaluator.check(&upper).await.is_ok());

        // Declined and unknown renderers fall back
        let id_only = Record::new().with("id", 3);
        assert_eq!(evaluator.evaluate(&upper, &id_only, RenderKind::Item).await, "3");
        let missing = RenderTemplate::parse("@missing");
        assert_eq!(evaluator.evaluate(&missing, &ann(), RenderKind::Item).await, "Ann");
        assert!(matches!(
            evaluator.check(&missing).await,
            Err(PickerError::UnknownRenderer(_))
        ));
    }
}

//! Template engine based on MiniJinja

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior};
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::datasource::Datasources;
use crate::error::{EngineError, Result, TemplateError};
use crate::filters;
use crate::functions;

/// Delimiter set used by a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    /// `{{ }}`, `{% %}` and `{# #}`, used by app templates
    #[default]
    Standard,
    /// `[[ ]]`, `[% %]` and `[# #]`, used by the main configuration document
    SelfRender,
}

impl Syntax {
    fn config(self) -> std::result::Result<Option<SyntaxConfig>, minijinja::Error> {
        match self {
            Self::Standard => Ok(None),
            Self::SelfRender => SyntaxConfig::builder()
                .block_delimiters("[%", "%]")
                .variable_delimiters("[[", "]]")
                .comment_delimiters("[#", "#]")
                .build()
                .map(Some),
        }
    }
}

/// Template engine builder
pub struct EngineBuilder {
    strict_mode: bool,
    syntax: Syntax,
    datasources: Arc<Datasources>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            strict_mode: true,
            syntax: Syntax::Standard,
            datasources: Arc::new(Datasources::default()),
        }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// Datasources exposed through `datasource`, `ds`, `datasource_exists` and `include`
    pub fn datasources(mut self, datasources: Arc<Datasources>) -> Self {
        self.datasources = datasources;
        self
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        Engine {
            strict_mode: self.strict_mode,
            syntax: self.syntax,
            datasources: self.datasources,
        }
    }
}

/// The template engine
pub struct Engine {
    strict_mode: bool,
    syntax: Syntax,
    datasources: Arc<Datasources>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Engine {
    /// Create a builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Create a configured MiniJinja environment
    fn create_environment(&self) -> Result<Environment<'static>> {
        let mut env = Environment::new();

        if let Some(config) = self.syntax.config().map_err(|e| {
            EngineError::Template(TemplateError::simple(format!(
                "invalid template syntax configuration: {}",
                e
            )))
        })? {
            env.set_syntax(config);
        }

        if self.strict_mode {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(UndefinedBehavior::Lenient);
        }
        env.set_keep_trailing_newline(true);

        env.add_filter("toyaml", filters::toyaml);
        env.add_filter("tojson", filters::tojson);
        env.add_filter("b64encode", filters::b64encode);
        env.add_filter("b64decode", filters::b64decode);
        env.add_filter("quote", filters::quote);
        env.add_filter("squote", filters::squote);
        env.add_filter("indent", filters::indent);
        env.add_filter("nindent", filters::nindent);
        env.add_filter("required", filters::required);
        env.add_filter("trimprefix", filters::trimprefix);
        env.add_filter("trimsuffix", filters::trimsuffix);
        env.add_filter("lowercamel", filters::lowercamel);
        env.add_filter("sha256", filters::sha256);

        env.add_function("fail", functions::fail);
        env.add_function("dict", functions::dict);
        env.add_function("list", functions::list);
        env.add_function("coalesce", functions::coalesce);
        env.add_function("eqfold", functions::eqfold);
        env.add_function("MyEq", functions::eqfold);
        env.add_function("getenv", functions::getenv);

        functions::register_datasources(&mut env, &self.datasources);

        Ok(env)
    }

    /// Render a single template string
    ///
    /// Top-level keys of `context` become template variables; any other
    /// document renders against an empty context.
    pub fn render_string(
        &self,
        template: &str,
        context: &JsonValue,
        template_name: &str,
    ) -> Result<String> {
        let mut env = self.create_environment()?;

        env.add_template_owned(template_name.to_string(), template.to_string())
            .map_err(|e| {
                EngineError::Template(TemplateError::from_minijinja(e, template_name, template))
            })?;

        let tmpl = env.get_template(template_name).map_err(|e| {
            EngineError::Template(TemplateError::from_minijinja(e, template_name, template))
        })?;

        let empty = JsonValue::Object(serde_json::Map::new());
        let ctx = if context.is_object() { context } else { &empty };

        tmpl.render(ctx).map_err(|e| {
            EngineError::Template(TemplateError::from_minijinja(e, template_name, template))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateErrorKind;
    use serde_json::json;

    #[test]
    fn test_standard_syntax() {
        let engine = Engine::default();
        let out = engine
            .render_string("chart: {{ app.chart }}\n", &json!({"app": {"chart": "stable/web"}}), "t")
            .unwrap();
        assert_eq!(out, "chart: stable/web\n");
    }

    #[test]
    fn test_self_render_syntax() {
        let engine = Engine::builder().syntax(Syntax::SelfRender).build();
        let out = engine
            .render_string(
                "b: '[[ values.a ]]bar'[# note #]\nc: {{ left }}\n",
                &json!({"values": {"a": "foo"}}),
                "mh.yaml",
            )
            .unwrap();
        assert_eq!(out, "b: 'foobar'\nc: {{ left }}\n");
    }

    #[test]
    fn test_strict_undefined() {
        let engine = Engine::default();
        let err = engine
            .render_string("{{ missing.key }}", &json!({}), "t")
            .unwrap_err();

        match err {
            EngineError::Template(te) => assert_eq!(te.kind(), TemplateErrorKind::UndefinedVariable),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lenient_undefined() {
        let engine = Engine::builder().strict(false).build();
        let out = engine.render_string("x{{ missing }}y", &json!({}), "t").unwrap();
        assert_eq!(out, "xy");
    }

    #[test]
    fn test_non_mapping_context() {
        let engine = Engine::default();
        let out = engine.render_string("static", &json!(["a"]), "t").unwrap();
        assert_eq!(out, "static");
    }

    #[test]
    fn test_filters_registered() {
        let engine = Engine::default();
        let out = engine
            .render_string(
                "{{ name | lowercamel }} {{ name | quote }}",
                &json!({"name": "my-app"}),
                "t",
            )
            .unwrap();
        assert_eq!(out, "myApp \"my-app\"");
    }

    #[test]
    fn test_syntax_error_has_span() {
        let engine = Engine::default();
        let err = engine
            .render_string("a: 1\nb: {{ oops\n", &json!({}), "broken.yaml")
            .unwrap_err();

        match err {
            EngineError::Template(te) => {
                assert_eq!(te.kind(), TemplateErrorKind::SyntaxError);
                assert!(te.span.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

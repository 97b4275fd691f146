//! HTML views (minijinja, templates embedded at compile time).

use minijinja::Environment;
use serde::Serialize;

use dtrelay_core::error::{RelayError, Result};

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../templates/layout.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("metrics_form.html", include_str!("../../templates/metrics_form.html")),
    ("datadomain_form.html", include_str!("../../templates/datadomain_form.html")),
    ("results.html", include_str!("../../templates/results.html")),
];

pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| RelayError::Internal(format!("template {name} failed to compile: {e}")))?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|t| t.render(ctx))
            .map_err(|e| RelayError::Internal(format!("render {name} failed: {e}")))
    }
}

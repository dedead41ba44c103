//! View outcomes produced by handlers and the renderers that turn them into
//! responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use petclinic_core::Errors;

/// A named view with its model and any field errors from form binding.
#[derive(Debug, Clone)]
pub struct View {
    name: &'static str,
    model: Map<String, Value>,
    errors: Errors,
}

impl View {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            model: Map::new(),
            errors: Errors::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.model.insert(key.to_string(), value.into());
        self
    }

    pub fn with_errors(mut self, errors: Errors) -> Self {
        self.errors.merge(errors);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn model(&self) -> &Map<String, Value> {
        &self.model
    }

    pub fn errors(&self) -> &Errors {
        &self.errors
    }
}

/// What a handler decided: render a view or redirect the browser.
#[derive(Debug, Clone)]
pub enum Outcome {
    View(View),
    Redirect(String),
}

impl Outcome {
    pub fn redirect(path: impl Into<String>) -> Self {
        Self::Redirect(path.into())
    }
}

impl From<View> for Outcome {
    fn from(view: View) -> Self {
        Self::View(view)
    }
}

/// Turns a [`View`] into an HTTP response. Templates plug in here.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: View) -> Response;
}

/// Renders `{"view": name, "model": {...}, "errors": {field: [messages]}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonViewRenderer;

impl ViewRenderer for JsonViewRenderer {
    fn render(&self, view: View) -> Response {
        let body = json!({
            "view": view.name,
            "model": view.model,
            "errors": view.errors.by_field(),
        });
        (StatusCode::OK, Json(body)).into_response()
    }
}

/// A `302 Found` pointing at `location`.
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use petclinic_core::validation::codes;

    #[test]
    fn view_collects_model_and_errors() {
        let mut errors = Errors::new();
        errors.reject_value("lastName", codes::NOT_FOUND, "not found");

        let view = View::new("owners/findOwners")
            .with("owner", json!({ "lastName": "Nobody" }))
            .with_errors(errors);

        assert_eq!(view.name(), "owners/findOwners");
        assert_eq!(view.model()["owner"]["lastName"], "Nobody");
        assert!(view.errors().has_field_errors("lastName"));
    }

    #[test]
    fn redirect_is_found_with_location() {
        let res = redirect("/owners/3");
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/owners/3");
    }
}

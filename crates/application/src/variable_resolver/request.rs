//! Request-level resolution
//!
//! Turns a stored [`ApiRequest`] into the snapshot that is actually sent.

use probe_domain::environment::{Environment, ResolutionScope, find_active};
use probe_domain::request::{ApiRequest, BodyType, HttpMethod, KeyValuePair};

use super::engine::VariableResolver;

/// Fully interpolated copy of a request.
///
/// Only enabled params, headers and form fields survive. Names of tokens that
/// had no value in scope are collected in `unresolved`, and the tokens
/// themselves stay in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    /// Source request id.
    pub id: String,
    /// Source request name.
    pub name: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Interpolated URL, without the params below.
    pub url: String,
    /// Effective query parameters.
    pub params: Vec<KeyValuePair>,
    /// Effective headers.
    pub headers: Vec<KeyValuePair>,
    /// Body text (interpolated for text-like body types).
    pub body: String,
    /// Body interpretation.
    pub body_type: BodyType,
    /// Effective form fields (interpolated for form bodies).
    pub form_data: Vec<KeyValuePair>,
    /// Token names with no value in scope, in first-seen order.
    pub unresolved: Vec<String>,
}

impl ResolvedRequest {
    /// URL with the query parameters appended.
    #[must_use]
    pub fn full_url(&self) -> String {
        if self.params.is_empty() {
            return self.url.clone();
        }
        let pairs: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|p| (p.key.as_str(), p.value.as_str()))
            .collect();
        let query = serde_urlencoded::to_string(pairs).unwrap_or_default();
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.url)
    }

    /// Returns true if every token was resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Body ready for the wire: the raw body, or the url-encoded form.
    #[must_use]
    pub fn encoded_body(&self) -> Option<String> {
        match self.body_type {
            BodyType::None => None,
            BodyType::Form => {
                let pairs: Vec<(&str, &str)> = self
                    .form_data
                    .iter()
                    .map(|p| (p.key.as_str(), p.value.as_str()))
                    .collect();
                serde_urlencoded::to_string(pairs).ok()
            }
            BodyType::Json | BodyType::Text | BodyType::Xml => Some(self.body.clone()),
        }
    }

    /// The request as it was sent, for history.
    #[must_use]
    pub fn to_api_request(&self) -> ApiRequest {
        let mut request = ApiRequest::new(self.name.clone(), self.method, self.url.clone())
            .with_id(self.id.clone());
        request.params.clone_from(&self.params);
        request.headers.clone_from(&self.headers);
        request.body.clone_from(&self.body);
        request.body_type = self.body_type;
        if self.body_type == BodyType::Form {
            request.form_data = Some(self.form_data.clone());
        }
        request
    }
}

struct Interpolator<'a> {
    resolver: &'a VariableResolver,
    unresolved: Vec<String>,
}

impl Interpolator<'_> {
    fn text(&mut self, input: &str) -> String {
        let result = self.resolver.resolve(input);
        for name in result.unresolved {
            if !self.unresolved.contains(&name) {
                self.unresolved.push(name);
            }
        }
        result.resolved
    }

    fn pairs<'p>(&mut self, pairs: impl Iterator<Item = &'p KeyValuePair>) -> Vec<KeyValuePair> {
        pairs
            .map(|pair| KeyValuePair::new(pair.key.clone(), self.text(&pair.value)))
            .collect()
    }
}

/// Resolves a request against a prepared resolver.
#[must_use]
pub fn resolve_with(request: &ApiRequest, resolver: &VariableResolver) -> ResolvedRequest {
    let mut interpolate = Interpolator {
        resolver,
        unresolved: Vec::new(),
    };

    let url = interpolate.text(&request.url);
    let params = interpolate.pairs(request.enabled_params());
    let headers = interpolate.pairs(request.enabled_headers());
    let body = if request.body_type.is_text_like() {
        interpolate.text(&request.body)
    } else {
        request.body.clone()
    };
    let form_data = if request.body_type == BodyType::Form {
        interpolate.pairs(request.enabled_form_data())
    } else {
        request.enabled_form_data().cloned().collect()
    };

    ResolvedRequest {
        id: request.id.clone(),
        name: request.name.clone(),
        method: request.method,
        url,
        params,
        headers,
        body,
        body_type: request.body_type,
        form_data,
        unresolved: interpolate.unresolved,
    }
}

/// Resolves a request against globals and the active environment.
///
/// Globals are applied first and the active environment overrides them. An
/// unknown or absent environment id means globals only.
#[must_use]
pub fn resolve_request(
    request: &ApiRequest,
    active_environment_id: Option<&str>,
    environments: &[Environment],
    globals: &[KeyValuePair],
) -> ResolvedRequest {
    let environment = find_active(environments, active_environment_id);
    let resolver = VariableResolver::new(ResolutionScope::from_sources(globals, environment));
    resolve_with(request, &resolver)
}

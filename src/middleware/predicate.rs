//! Gate: continue the pipeline or answer with an error response.
//!
//! - predicate passes → next stage runs with the unmodified request, its response is returned as is
//! - predicate fails → the error responder builds a response (401, empty body by default),
//!   then the optional error hook may replace it
//!
//! Decode errors never surface as failures of this middleware; responders read them
//! from the error attribute if they want to show them.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use tracing::debug;

use crate::context::AttributesExt;
use crate::middleware::responders::{ErrorResponder, JsonErrorResponder, StatusResponder};
use crate::settings::AttributeNames;
use crate::token::DecodedToken;

pub trait Predicate: Send + Sync {
    fn test(&self, request: &Request) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&Request) -> bool + Send + Sync,
{
    fn test(&self, request: &Request) -> bool {
        self(request)
    }
}

/// Receives the candidate error response; `Some` replaces it, `None` keeps it.
pub trait ErrorHook: Send + Sync {
    fn on_error(&self, request: &Request, response: &Response) -> Option<Response>;
}

impl<F> ErrorHook for F
where
    F: Fn(&Request, &Response) -> Option<Response> + Send + Sync,
{
    fn on_error(&self, request: &Request, response: &Response) -> Option<Response> {
        self(request, response)
    }
}

/// Default predicate: the token attribute holds a structured value.
#[derive(Debug, Clone)]
pub struct TokenPresent {
    attribute: String,
}

impl TokenPresent {
    pub fn new(names: &AttributeNames) -> Self {
        Self {
            attribute: names.token().to_string(),
        }
    }
}

impl Default for TokenPresent {
    fn default() -> Self {
        Self::new(&AttributeNames::default())
    }
}

impl Predicate for TokenPresent {
    fn test(&self, request: &Request) -> bool {
        request
            .attributes()
            .get(&self.attribute)
            .is_some_and(|attribute| attribute.is_structured())
    }
}

/// Predicate over the decoded token (or its absence) and the request.
///
/// ```ignore
/// let only_42 = TokenProbe::new(&names, |token, _req| {
///     token.and_then(|t| t.subject()) == Some("42")
/// });
/// ```
pub struct TokenProbe<F> {
    attribute: String,
    probe: F,
}

impl<F> TokenProbe<F>
where
    F: Fn(Option<&DecodedToken>, &Request) -> bool + Send + Sync,
{
    pub fn new(names: &AttributeNames, probe: F) -> Self {
        Self {
            attribute: names.token().to_string(),
            probe,
        }
    }
}

impl<F> Predicate for TokenProbe<F>
where
    F: Fn(Option<&DecodedToken>, &Request) -> bool + Send + Sync,
{
    fn test(&self, request: &Request) -> bool {
        let attributes = request.attributes();
        (self.probe)(attributes.token(&self.attribute), request)
    }
}

pub struct PredicateMiddleware {
    predicate: Box<dyn Predicate>,
    responder: Box<dyn ErrorResponder>,
    hook: Option<Box<dyn ErrorHook>>,
}

impl std::fmt::Debug for PredicateMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateMiddleware")
            .field("hook", &self.hook.is_some())
            .finish_non_exhaustive()
    }
}

impl PredicateMiddleware {
    pub fn new(
        predicate: impl Predicate + 'static,
        responder: impl ErrorResponder + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            responder: Box::new(responder),
            hook: None,
        }
    }

    /// Requires a decoded token in the token attribute; 401 with an empty body otherwise.
    pub fn assert_token(names: &AttributeNames) -> Self {
        Self::new(TokenPresent::new(names), StatusResponder::default())
    }

    /// Like [`assert_token`](Self::assert_token) but with a custom check on the token.
    pub fn probe<F>(names: &AttributeNames, probe: F) -> Self
    where
        F: Fn(Option<&DecodedToken>, &Request) -> bool + Send + Sync + 'static,
    {
        Self::new(TokenProbe::new(names, probe), StatusResponder::default())
    }

    pub fn with_responder(mut self, responder: impl ErrorResponder + 'static) -> Self {
        self.responder = Box::new(responder);
        self
    }

    /// JSON body from the error attribute instead of an empty one.
    pub fn with_json_errors(self, names: &AttributeNames) -> Self {
        self.with_responder(JsonErrorResponder::new(names))
    }

    pub fn with_error_hook(mut self, hook: impl ErrorHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// `Err` carries the response to send instead of calling the next stage.
    pub fn check(&self, request: &Request) -> Result<(), Response> {
        if self.predicate.test(request) {
            return Ok(());
        }

        debug!(uri = %request.uri(), "predicate failed, short-circuiting");
        let response = self.responder.respond(request);
        let response = match &self.hook {
            Some(hook) => hook.on_error(request, &response).unwrap_or(response),
            None => response,
        };
        Err(response)
    }

    pub async fn handle(&self, request: Request, next: Next) -> Response {
        match self.check(&request) {
            Ok(()) => next.run(request).await,
            Err(response) => response,
        }
    }

    /// Guards the routes already registered on `router`.
    ///
    /// Uses `route_layer`, so unknown paths still answer 404 rather than 401.
    /// `router` must have at least one route.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(
            Arc::new(self),
            predicate_middleware,
        ))
    }
}

async fn predicate_middleware(
    State(gate): State<Arc<PredicateMiddleware>>,
    req: Request,
    next: Next,
) -> Response {
    gate.handle(req, next).await
}

//! HTTP request handlers and routing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use log::debug;
use regex::Regex;

use crate::parser::Request;
use crate::server::error::Error;
use crate::server::session::Session;
use crate::server::status::StatusCode;

/// Type alias for the boxed future a handler returns.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>>;

/// Type alias for a handler: it receives the request (method and resource
/// included) and the session to answer through.
pub type HandlerFn =
    Arc<dyn for<'a> Fn(&'a Request, &'a mut Session) -> HandlerFuture<'a> + Send + Sync>;

/// Wrap a closure or function as a [`HandlerFn`].
///
/// Going through this bound lets closures such as
/// `|req, session| Box::pin(async move { ... })` be inferred as handlers.
pub fn handler_fn<F>(handler: F) -> HandlerFn
where
    F: for<'a> Fn(&'a Request, &'a mut Session) -> HandlerFuture<'a> + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// Represents a route in the HTTP server.
pub struct Route {
    /// The registered pattern, used verbatim for exact matches.
    pub pattern: String,
    /// The pattern anchored for full-string matching, `None` if it is not a
    /// valid regular expression.
    matcher: Option<Regex>,
    /// The handler function.
    pub handler: HandlerFn,
}

impl Route {
    fn new(pattern: String, handler: HandlerFn) -> Self {
        let matcher = match Regex::new(&format!("^(?:{pattern})$")) {
            Ok(regex) => Some(regex),
            Err(e) => {
                debug!("Route pattern {pattern:?} is not a valid regex, exact match only: {e}");
                None
            }
        };

        Self {
            pattern,
            matcher,
            handler,
        }
    }

    fn is_full_match(&self, resource: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|regex| regex.is_match(resource))
    }
}

/// Answers `404 Not Found` and nothing else.
fn not_found<'a>(_request: &'a Request, session: &'a mut Session) -> HandlerFuture<'a> {
    Box::pin(session.send_status(StatusCode::NotFound))
}

/// Maps resources to handlers.
///
/// An exact pattern match always wins. Otherwise the patterns are tried as
/// regular expressions in registration order and the first full match wins;
/// there is no ranking by specificity.
pub struct Router {
    routes: Vec<Route>,
    not_found: HandlerFn,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            not_found: Arc::new(not_found),
        }
    }

    /// Register `handler` for `pattern`, replacing the handler of an identical
    /// pattern in place.
    pub fn insert(&mut self, pattern: impl Into<String>, handler: HandlerFn) {
        let pattern = pattern.into();
        match self.routes.iter_mut().find(|route| route.pattern == pattern) {
            Some(route) => route.handler = handler,
            None => self.routes.push(Route::new(pattern, handler)),
        }
    }

    /// Resolve the handler for `resource`.
    ///
    /// Always returns a handler; unmatched resources get one that answers
    /// `404 Not Found`.
    pub fn resolve(&self, resource: &str) -> HandlerFn {
        self.find(resource)
            .map(|route| route.handler.clone())
            .unwrap_or_else(|| self.not_found.clone())
    }

    /// The route that would serve `resource`, if any.
    pub fn find(&self, resource: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.pattern == resource)
            .or_else(|| self.routes.iter().find(|route| route.is_full_match(resource)))
    }

    /// The registered patterns in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|route| route.pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

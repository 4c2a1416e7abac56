//! Client-side route gating.
//!
//! A pure decision function over the session state, so embedders can gate
//! navigation without a mutable global flag. The feed is the only private
//! route; the three auth pages are for signed-out users only; unknown paths
//! fall back to the feed.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Feed,
    Login,
    Register,
    ForgotPassword,
}

impl Route {
    /// Parses a client-side path. Unknown paths resolve to the feed, which
    /// then gates as usual.
    pub fn parse(path: &str) -> Route {
        match path.trim_end_matches('/') {
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/forgot-password" => Route::ForgotPassword,
            _ => Route::Feed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    Redirect(Route),
}

/// Gates a route against the current session state.
pub fn resolve(route: Route, signed_in: bool) -> RouteDecision {
    match (route, signed_in) {
        (Route::Feed, true) => RouteDecision::Render(Route::Feed),
        (Route::Feed, false) => RouteDecision::Redirect(Route::Login),
        (public, false) => RouteDecision::Render(public),
        (_, true) => RouteDecision::Redirect(Route::Feed),
    }
}

//! Route access gated on authentication.

/// Screens of the catalog client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Dashboard,
}

/// Resolve where a request for `requested` actually lands.
///
/// The dashboard requires a token; the login screen is skipped when one is
/// already present. The home screen is public.
pub fn guard(requested: Route, authenticated: bool) -> Route {
    match (requested, authenticated) {
        (Route::Dashboard, false) => {
            tracing::debug!("redirecting unauthenticated dashboard request to login");
            Route::Login
        }
        (Route::Login, true) => Route::Dashboard,
        (route, _) => route,
    }
}

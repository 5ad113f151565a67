use rocket::{
    http::Status,
    response::status::Custom,
    serde::json::Json,
    Catcher, Request, Route,
};

use crate::error::ErrorBody;

mod admin;
mod public;
mod voter;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(public::routes());
    routes.extend(voter::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// Render every error that did not come from a handler, such as failed
/// guards, unmatched routes and malformed bodies, in the same JSON shape as
/// handler errors.
#[catch(default)]
fn default_catcher(status: Status, req: &Request<'_>) -> Custom<Json<ErrorBody>> {
    // Guards that failed with a specific error leave it here.
    let body = req
        .local_cache(|| None::<ErrorBody>)
        .clone()
        .unwrap_or_else(|| ErrorBody {
            error: match status.code {
                400 | 422 => "bad_request",
                401 => "unauthorized",
                403 => "forbidden",
                404 => "not_found",
                _ => "internal",
            }
            .to_string(),
            message: status.reason_lossy().to_string(),
            violations: None,
        });
    Custom(status, Json(body))
}

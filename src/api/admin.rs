use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::{Admin, AuthToken},
            poll::{PollDescription, PollSpec},
            stats::DashboardStats,
        },
        mongodb::Id,
    },
    store::PollStore,
};

pub fn routes() -> Vec<Route> {
    routes![create_poll, delete_poll, get_stats]
}

#[post("/polls", data = "<spec>", format = "json")]
async fn create_poll(
    _token: AuthToken<Admin>,
    spec: Json<PollSpec>,
    store: &State<PollStore>,
) -> Result<Json<PollDescription>> {
    let poll = store.create(spec.0).await?;
    Ok(Json(PollDescription::new(poll, Utc::now(), None)))
}

#[delete("/polls/<poll_id>")]
async fn delete_poll(
    _token: AuthToken<Admin>,
    poll_id: Id,
    store: &State<PollStore>,
) -> Result<()> {
    store.delete(poll_id).await
}

#[get("/stats")]
async fn get_stats(
    _token: AuthToken<Admin>,
    store: &State<PollStore>,
) -> Result<Json<DashboardStats>> {
    let polls = store.list().await?;
    Ok(Json(DashboardStats::new(&polls, Utc::now())))
}

use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::{
    engine::status_at,
    error::Result,
    model::{
        api::{
            auth::{AuthToken, Voter},
            poll::{PollDescription, PollResults, PollSummary},
        },
        common::PollStatus,
        mongodb::Id,
    },
    store::PollStore,
};

pub fn routes() -> Vec<Route> {
    routes![list_polls, get_poll, get_results]
}

/// All polls ordered by start time, optionally only those with the given status.
#[get("/polls?<status>")]
async fn list_polls(
    status: Option<PollStatus>,
    store: &State<PollStore>,
) -> Result<Json<Vec<PollSummary>>> {
    let now = Utc::now();
    let polls = store.list().await?;
    let summaries = polls
        .iter()
        .filter(|poll| status.map_or(true, |status| status_at(poll, now) == status))
        .map(|poll| PollSummary::new(poll, now))
        .collect();
    Ok(Json(summaries))
}

#[get("/polls/<poll_id>")]
async fn get_poll(
    token: Option<AuthToken<Voter>>,
    poll_id: Id,
    store: &State<PollStore>,
) -> Result<Json<PollDescription>> {
    let poll = store.get(poll_id).await?;
    let voter = token.as_ref().map(|token| &token.id);
    Ok(Json(PollDescription::new(poll, Utc::now(), voter)))
}

#[get("/polls/<poll_id>/results")]
async fn get_results(poll_id: Id, store: &State<PollStore>) -> Result<Json<PollResults>> {
    let poll = store.get(poll_id).await?;
    Ok(Json(PollResults::new(&poll, Utc::now())?))
}

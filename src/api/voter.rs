use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::{AuthToken, Voter},
            vote::{BallotDesc, VoteRequest},
        },
        mongodb::Id,
    },
    store::PollStore,
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, get_ballot]
}

#[post("/polls/<poll_id>/votes", data = "<vote>", format = "json")]
async fn cast_vote(
    token: AuthToken<Voter>,
    poll_id: Id,
    vote: Json<VoteRequest>,
    store: &State<PollStore>,
) -> Result<()> {
    store
        .cast_vote(poll_id, &token.id, vote.candidate_id, Utc::now())
        .await?;
    Ok(())
}

/// The requesting voter's own ballot, so a client can tell whether they have voted.
#[get("/polls/<poll_id>/ballot")]
async fn get_ballot(
    token: AuthToken<Voter>,
    poll_id: Id,
    store: &State<PollStore>,
) -> Result<Json<BallotDesc>> {
    let poll = store.get(poll_id).await?;
    Ok(Json(BallotDesc {
        poll_id,
        candidate_id: poll.ballot(&token.id),
    }))
}

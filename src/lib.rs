#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, StoreFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;

/// Assemble the server: configuration, storage, logging, routes and catchers.
pub fn build() -> Rocket<Build> {
    assemble(rocket::build())
}

fn assemble(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(StoreFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// A server over the given store, with a fixed JWT secret.
#[cfg(test)]
pub(crate) fn rocket_for_test(store: store::PollStore) -> Rocket<Build> {
    let figment = rocket::Config::figment().merge(("jwt_secret", "test-secret"));
    assemble(rocket::custom(figment).manage(store))
}

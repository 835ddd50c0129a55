//! Job posting collection — data model and HTTP routes.

pub mod model;
pub mod routes;

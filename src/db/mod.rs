pub mod dbclient;
pub mod schema;
pub mod users;
pub mod votings;

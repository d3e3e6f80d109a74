pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod providers;
pub mod routes;
pub mod scraping;
pub mod search;
pub mod worker;

#[cfg(test)]
mod testing;

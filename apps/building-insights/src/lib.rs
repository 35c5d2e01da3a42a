pub mod cli;
pub mod config;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod time;

#[cfg(test)]
pub mod test_support;

// Library exports for Folio
// This allows integration tests and external code to use Folio modules

pub mod accounts;
pub mod auth;
pub mod blog;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod forms;
pub mod mail;
pub mod routes;
pub mod state;

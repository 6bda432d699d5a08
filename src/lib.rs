pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod form_client;
pub mod routes;
pub mod startup;
pub mod telemetry;

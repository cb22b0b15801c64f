pub mod login;
pub mod routing;
pub mod settings;
pub mod telemetry;

pub mod app_error;
pub mod health;
pub mod lint;
pub mod push;
pub mod server;
pub mod state;

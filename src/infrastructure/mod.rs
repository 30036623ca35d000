pub mod auth;
pub mod gmail;
pub mod logging;
pub mod notification;

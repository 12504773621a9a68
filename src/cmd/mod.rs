pub mod assignee;
pub mod auth;
pub mod config;
pub mod history;
pub mod ticket;

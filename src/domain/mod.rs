pub mod assignee;
pub mod audit;
pub mod label;
pub mod options;
pub mod ticket;

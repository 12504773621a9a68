pub mod assignees;
pub mod auth;
pub mod tickets;

pub use assignees::AssigneeService;
pub use auth::AuthService;
pub use tickets::{HistoryQuery, TicketService};

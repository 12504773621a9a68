use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{AssigneeService, AuthService, TicketService};
use crate::session::Session;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub session: Session,
    pub auth: Arc<dyn AuthService>,
    pub tickets: Arc<dyn TicketService>,
    pub assignees: Arc<dyn AssigneeService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        session: Session,
        auth: Arc<dyn AuthService>,
        tickets: Arc<dyn TicketService>,
        assignees: Arc<dyn AssigneeService>,
    ) -> Self {
        Self {
            config,
            session,
            auth,
            tickets,
            assignees,
        }
    }
}

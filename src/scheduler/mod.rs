pub mod service;
pub mod state_manager;

pub use service::{JobExecutor, JobScheduler};
pub use state_manager::{JobStateManager, StatusReceiver, StatusSender};

pub mod ptw_authorization;
pub mod site;
pub mod task;
pub mod task_update;
pub mod user;

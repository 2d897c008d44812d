pub mod activity_log;
pub mod client;
pub mod dashboard_settings;
pub mod document;
pub mod milestone;
pub mod milestone_template;
pub mod tender;

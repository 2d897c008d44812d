pub mod activity;
pub mod config;
pub mod dashboard;
pub mod database_validator;
pub mod document_viewer;
pub mod storage;
pub mod workflow;

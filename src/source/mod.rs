pub mod archive;
pub mod state_log;
pub mod web;

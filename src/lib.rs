pub mod acquire;
pub mod cli;
pub mod config;
pub mod decode;
pub mod model;
pub mod publish;
pub mod source;
pub mod timeslot;

pub mod ask;
pub mod config;
pub mod reminder;
pub mod run;
pub mod session;

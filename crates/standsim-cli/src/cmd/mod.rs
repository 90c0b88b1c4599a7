pub mod actions;
pub mod config;
pub mod encode;
pub mod fields;
pub mod init;
pub mod run;
pub mod script;

pub mod config;
pub mod reveal;
pub mod run;
pub mod voices;

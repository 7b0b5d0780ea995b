pub mod action;
pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod input;
pub mod system;
pub mod terminal;
pub mod ui;
pub mod view;

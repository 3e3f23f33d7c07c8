//! TaskTide: a terminal to-do list.
//!
//! [`task_store::TaskStore`] owns the task and category collections and
//! persists them through a [`storage::KeyValueStore`] after every change.
//! [`app::App`] maps key presses onto store operations and [`ui`] draws it.

pub mod app;
pub mod config;
pub mod error;
pub mod filter;
pub mod notice;
pub mod storage;
pub mod task;
pub mod task_store;
pub mod theme;
pub mod ui;

//! Offline-first content layer of the Esteana app.
//!
//! - [`db`]: on-device document store (settings, scripture, bookmarks, action log)
//! - [`acquisition`]: the source cascade that fills the scripture store
//! - [`bridge`]: request/response protocol between content and native host
//! - [`host`]: the native host side of the bridge and the virtual asset host
//! - [`daily`]: daily tasks and wisdom
//! - [`sync`]: action-log upload

pub mod acquisition;
pub mod bridge;
pub mod config;
pub mod daily;
pub mod db;
pub mod host;
pub mod models;
pub mod sync;

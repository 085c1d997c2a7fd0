//! Pagetree: page tree, content composition and seeding core
//!
//! Pages are organized in one tree per language below a single global root.
//! Each page is composed of ordered elements, optionally grouped into cells;
//! each element holds ordered contents, and each content owns one typed
//! essence. The seeder bootstraps an installation and upgrades legacy data.

pub mod cli;
pub mod composition;
pub mod config;
pub mod error;
pub mod essence;
pub mod language;
pub mod layouts;
pub mod logging;
pub mod page;
pub mod schema;
pub mod seeder;
pub mod store;
pub mod types;

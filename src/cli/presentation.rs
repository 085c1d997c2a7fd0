//! CLI presentation: text and json formatters per command family.

mod listings;
mod reports;

pub use listings::{
    format_languages_json, format_languages_text, format_tree_json, format_tree_text, TreeRow,
};
pub use reports::{format_seed_report, format_upgrade_report, format_verify_report};

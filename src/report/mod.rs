//! Report rendering and persistence.

pub mod generator;

pub use generator::{
    generate_markdown_report, generate_members_listing, load_saved_report, write_json_report,
};

pub mod json;
pub mod text;

pub use json::{export_json_to_path, import_json};
pub use text::export_tsv_to_path;

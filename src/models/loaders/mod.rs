pub mod image_tree;
pub mod json_loader;
pub mod toml_loader;

pub use image_tree::{list_images, load_skip_list, scan_batches, BatchImage, BatchSource};
pub use json_loader::load_manual_mapping;
pub use toml_loader::{load_layout_pair, load_lookup_table, LookupRow};

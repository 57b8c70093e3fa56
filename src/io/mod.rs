//! File system access: image files in, tables out

pub mod image_access;
pub mod table_io;

pub use image_access::{list_image_files, load_image, save_png, setup_images_path, VALID_IMAGE_FORMATS};
pub use table_io::{read_table, write_table, DATASET_FILE_NAME, FEATURES_FILE_NAME};

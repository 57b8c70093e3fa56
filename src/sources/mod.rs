//! Row sources: the ways of turning inputs into a feature table

pub mod dataset;
pub mod directory_scan;
pub mod images_table;
pub mod label_image;
pub mod label_table;
pub mod source_strategy;

pub use dataset::DatasetSource;
pub use directory_scan::DirectoryScanSource;
pub use images_table::ImagesTableSource;
pub use label_image::LabelImageSource;
pub use label_table::LabelTableSource;
pub use source_strategy::{DirectoryPolicy, RowSource, SourceContext};

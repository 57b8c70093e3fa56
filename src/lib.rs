pub mod api;
pub mod commands;
pub mod config;
pub mod errors;
pub mod featurizer;
pub mod imaging;
pub mod io;
pub mod normalize;
pub mod sources;
pub mod table;
pub mod utils;

pub use crate::api::FeatureScope;

pub use config::PipelineConfig;
pub use errors::{FeatureError, FeatureResult};
pub use featurizer::{Featurizer, IntensityFeaturizer, Params};
pub use imaging::{LabelImage, RegionProperty, ThumbnailEncoder};
pub use normalize::ColumnNormalizer;
pub use sources::RowSource;
pub use table::{Record, RowTable, Value};

pub mod builder;
pub mod catalog;
pub mod models;
pub mod validation;

pub use builder::{build_input_row, RowBuildError};
pub use catalog::{load_catalog, load_catalog_from_readers, location_name, CatalogLoad, CatalogLoadError};
pub use models::*;
pub use validation::{validate, ValidationError, INCOMPLETE_SELECTION_MESSAGE};

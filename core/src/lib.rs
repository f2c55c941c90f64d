pub mod backup;
pub mod client_extractor;
pub mod clock;
pub mod coerce;
pub mod config;
pub mod contacts;
pub mod error;
pub mod field_map;
pub mod pipeline;
pub mod product_extractor;
pub mod record;
pub mod schema;
pub mod transform;
pub mod types;
pub mod validate;

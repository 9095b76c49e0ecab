// Used by the record macros from the crates using them.
pub use anyhow;
pub use lazy_static;

pub mod warn;
pub mod error;
pub mod http_response_status_codes;
pub mod html;
pub mod schema;
pub mod capability;
pub mod path_codec;
pub mod query;
pub mod criteria;
pub mod record;
pub mod search_registry;
pub mod table;
pub mod templates;
pub mod acontext;
pub mod engine;
pub mod router;
pub mod registrar;
pub mod apachelog;
pub mod config;
pub mod server;

// ~demo specific
pub mod demo;

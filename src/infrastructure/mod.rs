// Infrastructure layer - External dependencies and adapters
pub mod bounded_protocol;
pub mod config;
pub mod file_store;
pub mod google_trends;
pub mod thrift_codec;

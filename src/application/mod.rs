// Application layer - Seams and the polling use case
pub mod errors;
pub mod generation_store;
pub mod poll_controller;
pub mod trend_source;

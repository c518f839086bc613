/// Database layer: connection pool and embedded migrations
///
/// Row types and their queries live in [`crate::models`].

pub mod migrations;
pub mod pool;

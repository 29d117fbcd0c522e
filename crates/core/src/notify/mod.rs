pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod log;
pub mod port;
pub mod send;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

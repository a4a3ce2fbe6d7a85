//! In-process aligners for tests and dry runs

mod mock;

pub use mock::MockAligner;

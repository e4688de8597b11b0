//! Integration test harness for arbor.
//!
//! A `Recorder` observes a node; a `Scenario` runs named steps against a
//! node and checks what each step emitted with an `Expect`.

mod error;
mod scenario;

pub use error::{HarnessError, HarnessResult};
pub use expect::{Delivered, Expect};
pub use recorder::Recorder;
pub use scenario::Scenario;

/// Everything a scenario file needs.
pub mod prelude {
    pub use crate::{Expect, HarnessError, HarnessResult, Recorder, Scenario};
    pub use arbor_node::*;
}

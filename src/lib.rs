//! daqlog - periodic data acquisition logger.
//!
//! daqlog samples a data source at a fixed period, appends every raw reading
//! to a timestamped text log, and keeps two bounded in-memory views of the
//! run: a short window of the most recent raw points and a long history that
//! is adaptively decimated so it always spans the whole run in O(H) memory.
//! Both views are periodically rendered to charts that a small HTTP front end
//! serves.
//!
//! # Architecture
//!
//! - `acquisition`: data sources and the periodic acquirer
//! - `history`: sample queue, raw log, short and long history
//! - `plot`: chart rendering with a shared snapshot buffer
//! - `worker`: threads with cooperative cancellation and terminal states
//! - `application`: the pipeline context wiring the stages together
//! - `api`: HTTP front end
//! - `cli`: command-line interface
//! - `core`: configuration, errors and shared types
//!
//! # Example
//!
//! ```no_run
//! use daqlog_lib::acquisition::scalar;
//! use daqlog_lib::plot::svg_factory;
//! use daqlog_lib::{Config, Pipeline};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::new(
//!         Config::default(),
//!         Box::new(scalar(|| Ok(21.5))),
//!         svg_factory(1280, 720),
//!     )?;
//!     pipeline.start()?;
//!     std::thread::sleep(std::time::Duration::from_secs(10));
//!     for status in pipeline.stop() {
//!         println!("{}: {:?}", status.name, status.state);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod acquisition;
pub mod api;
pub mod application;
pub mod cli;
pub mod core;
pub mod history;
pub mod plot;
pub mod worker;

// Re-export core types for convenience
pub use crate::application::Pipeline;
pub use crate::core::{Config, DaqError, Result};

//! atoz: extract API documentation from `---ATOZAPI---` blocks.
//!
//! The blocks may sit in comments of any language; only the literal markers
//! and `@tag` lines inside them are looked at. A run goes
//! scan → parse → assemble → register, and yields a [`registry::Catalog`]
//! plus a list of [`diagnostics::Diagnostic`]s.
//!
//! ```no_run
//! use atoz::{pipeline, Config, SourceFile};
//!
//! let src = SourceFile::new("user.php", std::fs::read_to_string("user.php").unwrap());
//! let out = pipeline::run(&[src], &Config::default());
//! for d in &out.diagnostics {
//!     eprintln!("{d}");
//! }
//! ```

pub mod assemble;
pub mod config;
pub mod diagnostics;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod render;
pub mod schema;

pub use config::{Config, Markers};
pub use diagnostics::{Diagnostic, Severity};
pub use model::{Endpoint, FieldNode, ObjectDoc, Setting};
pub use pipeline::{run, RunOutput, SourceFile};
pub use registry::{Catalog, EndpointRegistry};

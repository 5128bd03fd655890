//! # Prodoc: Documentation Generator for `.pro` Routine Sources
//!
//! Prodoc scans a source tree of `.pro` files (a weakly delimited
//! `pro`/`function` syntax with `;` comments, `;+`/`;-` documentation blocks,
//! `$` line continuation, and `Class::method` routine names), builds a
//! cross-referenced object model, and renders it into a multi-page HTML site
//! with index and category pages. This library provides:
//!
//! - **Comment/Code Classification**: a single-pass state machine separating
//!   documentation blocks from code without a full grammar
//! - **Signature Extraction**: routine names, parameters, and keyword
//!   arguments across continuation lines
//! - **Documentation Dialects**: pluggable tag grammars selected per file
//! - **Cross-Referencing**: class hierarchies resolved through a type
//!   introspection oracle, with property and field ownership tracking
//! - **Aggregation**: name index, categories, todo/bug/obsolete registries,
//!   and documentation-completeness scoring
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prodoc::{BuildSession, ProdocConfig};
//! use prodoc::core::oracle::NullOracle;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProdocConfig::default();
//!     let mut session = BuildSession::new(config);
//!     session.parse_path("./lib/mgunits.pro", &NullOracle)?;
//!     session.finish();
//!     println!("{} routines documented", session.summary().routines);
//!     Ok(())
//! }
//! ```

#![warn(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Core model and cross-referencing
pub mod core {
    //! Object model, registries, and cross-reference resolution.

    pub mod classes;
    pub mod config;
    pub mod errors;
    pub mod model;
    pub mod oracle;
    pub mod session;
    pub mod typedesc;
}

// Source parsing: tokenizer, classifier, header parser
pub mod parse {
    //! Line tokenization and comment/code classification.

    pub mod classifier;
    pub mod header;
    pub mod tokenizer;
}

// Documentation comment dialects and markup renderers
pub mod dialect {
    //! Pluggable documentation-format dialects and markup renderers.

    mod registry;
    pub mod markup;
    pub mod tagged;
    pub mod verbatim;

    pub use registry::{DialectParser, DialectRegistry, FormatDirective, Overview};
}

// File discovery and report output
pub mod io {
    //! File discovery and rendered output.

    pub mod discovery;
    pub mod reports;
}

// Re-export primary types for convenience
pub use crate::core::config::{DocLevel, ProdocConfig};
pub use crate::core::errors::{ProdocError, Result};
pub use crate::core::session::{BuildSession, RunSummary};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

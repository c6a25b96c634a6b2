// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # scripture-graph
//!
//! Builds a cross-reference graph of scripture verses and study-guide topics
//! from EPUB footnotes, then suggests further edges by structural and
//! semantic similarity.
//!
//! ## Architecture
//!
//! - **Citations** (`citation`): footnote text to node keys, driven by curated tables
//! - **Extraction** (`extract`): chapter and guide pages to verse/topic/reference records
//! - **Corpus** (`corpus`): archive reading, page classification and the record fold
//! - **Topics** (`topics`): abbreviated topic citations resolved to canonical titles
//! - **Graph** (`graph`): petgraph cross-reference graph, similarity and export
//! - **Pipeline** (`pipeline`): the full fail-fast rebuild
//!
//! ## Library usage
//!
//! The text similarity pass loads a pretrained sentence model and needs the
//! `sentence-model` feature. Without it, set `similarity.run_semantic` to
//! false or pass an embedder to [`pipeline::rebuild_with`].
//!
//! ```no_run
//! use scripture_graph::config::PipelineConfig;
//! use scripture_graph::corpus::epub::read_archives;
//! use scripture_graph::graph::export::Snapshot;
//! use scripture_graph::pipeline::rebuild;
//!
//! let entries = read_archives(&["scriptures.epub"]).unwrap();
//! let result = rebuild(&entries, &PipelineConfig::default()).unwrap();
//! Snapshot::from_graph(&result.graph)
//!     .write("graph.json".as_ref())
//!     .unwrap();
//! ```

pub mod canon;
pub mod citation;
pub mod config;
pub mod corpus;
pub mod embed;
pub mod error;
pub mod extract;
pub mod graph;
pub mod model;
pub mod pipeline;
pub mod topics;

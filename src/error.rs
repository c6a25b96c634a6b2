//! Rich diagnostic error types for the scripture graph rebuild.
//!
//! Each stage defines its own error type with miette `#[diagnostic]` derives,
//! carrying the offending snippet (citation text, page path, node key) so a
//! failed rebuild points at exactly what broke it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for a corpus rebuild.
///
/// Each variant wraps a stage-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum ScriptureError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Citation(#[from] CitationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Topic(#[from] TopicError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Similarity(#[from] SimilarityError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Citation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CitationError {
    #[error("unrecognized reference syntax: \"{text}\"")]
    #[diagnostic(
        code(scripture::citation::syntax),
        help(
            "The citation matched neither the scripture grammar, a TG/ITC clause, \
             nor an ignorable prefix. If this is prose that should not produce an \
             edge, add its prefix to `ignored_prefixes` in the citation tables."
        )
    )]
    Syntax { text: String },
}

pub type CitationResult<T> = std::result::Result<T, CitationError>;

// ---------------------------------------------------------------------------
// Extraction errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExtractError {
    #[error("could not find verse number for {book} {chapter}: \"{text}\"")]
    #[diagnostic(
        code(scripture::extract::missing_verse_number),
        help(
            "A verse element has no `.verseNumber` child. If the text is an \
             unnumbered insertion, add its prefix to `verse_exceptions`."
        )
    )]
    MissingVerseNumber {
        book: String,
        chapter: u32,
        text: String,
    },

    #[error("self reference {key} in \"{text}\"")]
    #[diagnostic(
        code(scripture::extract::self_reference),
        help(
            "A citation resolved to the verse or topic that contains it. This is \
             a parser defect, not data: check the citation grammar against the text."
        )
    )]
    SelfReference { key: String, text: String },

    #[error("citation list on {page} appears before any verse label: \"{text}\"")]
    #[diagnostic(
        code(scripture::extract::missing_source),
        help("Every footnote list item must follow a `.label-verse` on the same page.")
    )]
    MissingSource { page: String, text: String },

    #[error("unrecognized page header \"{title}\"")]
    #[diagnostic(
        code(scripture::extract::unknown_header),
        help(
            "The `<title>` text does not name a known book. Add the full book name \
             to the canon tables or classify the page as structural."
        )
    )]
    UnknownHeader { title: String },

    #[error("malformed {what} \"{text}\"")]
    #[diagnostic(
        code(scripture::extract::malformed_number),
        help("Chapter and verse labels must be plain decimal integers.")
    )]
    MalformedNumber { what: String, text: String },

    #[error("guide page {page} has no title")]
    #[diagnostic(
        code(scripture::extract::missing_title),
        help("Topical guide and index pages need a `.title`, `<h1>` or `<title>` element.")
    )]
    MissingTitle { page: String },

    #[error("{page}: {source}")]
    #[diagnostic(code(scripture::extract::citation))]
    Citation {
        page: String,
        #[source]
        #[diagnostic_source]
        source: CitationError,
    },
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// ---------------------------------------------------------------------------
// Corpus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CorpusError {
    #[error("failed to open archive {path}: {message}")]
    #[diagnostic(
        code(scripture::corpus::archive),
        help("Verify the file is a valid EPUB and not corrupted.")
    )]
    Archive { path: String, message: String },

    #[error("I/O error reading {path}")]
    #[diagnostic(
        code(scripture::corpus::io),
        help("A filesystem operation failed. Check file paths and permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type CorpusResult<T> = std::result::Result<T, CorpusError>;

// ---------------------------------------------------------------------------
// Topic correction errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TopicError {
    #[error("unresolved topic {key} (cited from {source_key})")]
    #[diagnostic(
        code(scripture::topic::unresolved),
        help(
            "The abbreviated title matched no alias segment of any known topic. \
             Add an entry to `topic_aliases` in the citation tables."
        )
    )]
    Unresolved { key: String, source_key: String },

    #[error("ambiguous topic {key} (cited from {source_key}): matches {candidates}")]
    #[diagnostic(
        code(scripture::topic::ambiguous),
        help("Pin the intended title with an entry in `topic_aliases`.")
    )]
    Ambiguous {
        key: String,
        source_key: String,
        candidates: String,
    },

    #[error("topic {cited} on {key} resolves to itself")]
    #[diagnostic(
        code(scripture::topic::self_reference),
        help("The corrected reference would be a self-loop. Check the page's \"See also\" clause.")
    )]
    SelfReference { key: String, cited: String },
}

pub type TopicResult<T> = std::result::Result<T, TopicError>;

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("unknown book: \"{book}\"")]
    #[diagnostic(
        code(scripture::graph::unknown_book),
        help("Every node must belong to a book or guide listed in the volume table.")
    )]
    UnknownBook { book: String },

    #[error("missing node {key} for reference {source_key} -> {target_key}")]
    #[diagnostic(
        code(scripture::graph::missing_node),
        help(
            "A reference points at a node that was never extracted. This indicates \
             a corpus or parsing inconsistency; inspect the citation that produced it."
        )
    )]
    MissingNode {
        key: String,
        source_key: String,
        target_key: String,
    },

    #[error("snapshot error at {path}: {message}")]
    #[diagnostic(
        code(scripture::graph::snapshot),
        help("The graph snapshot could not be written or read. Check the path and JSON format.")
    )]
    Snapshot { path: String, message: String },

    #[error("self reference {source_key} -> {target_key}")]
    #[diagnostic(
        code(scripture::graph::self_reference),
        help("A node may not cite itself. Inspect the citation that produced this reference.")
    )]
    SelfReference {
        source_key: String,
        target_key: String,
    },
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;

// ---------------------------------------------------------------------------
// Similarity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SimilarityError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(scripture::similarity::dim_mismatch),
        help("All embeddings in one pass must come from the same embedder.")
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedder returned {actual} vectors for {expected} texts")]
    #[diagnostic(
        code(scripture::similarity::embedding),
        help("The embedder must return exactly one vector per input text.")
    )]
    Embedding { expected: usize, actual: usize },

    #[error("unknown sentence model \"{model}\"")]
    #[diagnostic(
        code(scripture::similarity::unknown_model),
        help("Supported: all-MiniLM-L6-v2, all-MiniLM-L12-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5.")
    )]
    UnknownModel { model: String },

    #[error("sentence model {model} failed: {message}")]
    #[diagnostic(
        code(scripture::similarity::model),
        help("The model is downloaded on first use. Check network access and the model cache directory.")
    )]
    Model { model: String, message: String },

    #[error("sentence model {model} is not compiled in")]
    #[diagnostic(
        code(scripture::similarity::model_unavailable),
        help(
            "Build with `--features sentence-model`, or disable the text pass with \
             `similarity.run_semantic = false` (`--skip-semantic`)."
        )
    )]
    ModelUnavailable { model: String },

    #[error("the text similarity pass is enabled but no embedder was given")]
    #[diagnostic(
        code(scripture::similarity::no_embedder),
        help("Pass a text embedder, or set `similarity.run_semantic = false`.")
    )]
    MissingEmbedder,
}

pub type SimilarityResult<T> = std::result::Result<T, SimilarityError>;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file: {path}")]
    #[diagnostic(code(scripture::config::read), help("Ensure the file exists and is readable."))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    #[diagnostic(code(scripture::config::parse), help("Check the TOML syntax and field names."))]
    Parse { path: String, message: String },

    #[error("failed to write config file: {path}")]
    #[diagnostic(code(scripture::config::write), help("Check that the directory is writable."))]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(scripture::config::invalid), help("{message}"))]
    Invalid { message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Convenience alias for functions returning rebuild results.
pub type ScriptureResult<T> = std::result::Result<T, ScriptureError>;

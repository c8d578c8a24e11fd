//! # ADbS Memory
//!
//! A local, file-backed knowledge store that incrementally indexes a
//! directory tree and answers retrieval queries over it.
//!
//! Files are split into overlapping character windows, stored in SQLite
//! with an FTS5 keyword index, and (when a local embedding model is
//! available) embedded for semantic search. Re-running `index` only
//! touches files whose content changed; `sync` drops files that vanished.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────────┐
//! │  Directory  │──▶│   Indexer    │──▶│    SQLite     │
//! │    walk     │   │ Chunk+Embed  │   │ FTS5 + vectors│
//! └─────────────┘   └──────────────┘   └───────┬───────┘
//!                                              │
//!                          ┌───────────────────┤
//!                          ▼                   ▼
//!                   ┌────────────┐      ┌────────────┐
//!                   │   query    │      │    sync    │
//!                   │ sem → kw   │      │   prune    │
//!                   └────────────┘      └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! adbs-memory init
//! adbs-memory index .
//! adbs-memory query "connection pooling" --limit 5
//! adbs-memory sync .
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and identifiers |
//! | [`chunk`] | Fixed-window text chunking |
//! | [`store`] | Documents, chunks and vectors |
//! | [`lexical`] | FTS5 keyword search |
//! | [`embedding`] | Embedding backend abstraction |
//! | [`vector`] | Optional semantic index |
//! | [`ingest`] | Change-aware indexing |
//! | [`search`] | Query routing |
//! | [`sync`] | Ghost pruning |
//! | [`ignore`] | Name-glob ignore predicate |
//! | [`progress`] | Index progress on stderr |
//! | [`stats`] | Store statistics |
//! | [`format`] | Table and key-value output |
//! | [`error`] | Per-file skip reasons |
//! | [`engine`] | Per-invocation facade |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod format;
pub mod ignore;
pub mod ingest;
pub mod lexical;
pub mod migrate;
pub mod models;
pub mod progress;
pub mod search;
pub mod stats;
pub mod store;
pub mod sync;
pub mod vector;

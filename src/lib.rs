//! # docsum
//!
//! A document summarization service. Upload a plain-text, Word or PDF
//! document and get back an abstractive summary at one of three lengths,
//! with word-count statistics; hand a summary back and get a `.docx`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌──────────┐
//! │ Extract  │──▶│ Truncate │──▶│  Length  │──▶│ Summarizer │──▶│  Stats   │
//! │ txt/docx │   │ 1000 wds │   │  policy  │   │ BART/Ollama│   │ counts,% │
//! │   /pdf   │   └──────────┘   └──────────┘   └────────────┘   └──────────┘
//! └──────────┘
//!        ▲                   Pipeline (orchestrator)
//!        │
//!   ┌────┴─────┐       ┌──────────┐
//!   │   HTTP   │       │   CLI    │
//!   │  (axum)  │       │ (docsum) │
//!   └──────────┘       └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Core data types |
//! | [`extract`] | Text extraction per document format |
//! | [`length`] | Length tier → generation bounds |
//! | [`truncate`] | Word-based input truncation |
//! | [`summarizer`] | Summarization model abstraction |
//! | [`stats`] | Word counts and reduction percentages |
//! | [`pipeline`] | End-to-end orchestration and error contract |
//! | [`download`] | Summary `.docx` packaging |
//! | [`server`] | HTTP server |
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Tracing setup |

pub mod config;
pub mod download;
pub mod extract;
pub mod length;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod stats;
pub mod summarizer;
pub mod truncate;

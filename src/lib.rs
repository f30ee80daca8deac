//! # landmark-id
//!
//! Identifies a landmark building from a photo embedding by exact
//! nearest-neighbour search over a small in-memory catalog of reference
//! embeddings, then votes across the closest matches to decide how sure
//! it is.
//!
//! ## Architecture
//!
//! Embedding generation happens upstream; this crate starts from a
//! fixed-length query vector:
//!
//! ```text
//!          ┌──────────────────────┐
//!          │ Query embedding (D)  │
//!          └──────────┬───────────┘
//!                     │ validate: dimension, finite, non-zero
//!                     ▼
//!          ┌──────────────────────┐      ┌──────────────────────┐
//!          │  Cosine similarity   │◄─────│  Catalog snapshot    │
//!          │  vs. every entry     │      │  (immutable, Arc)    │
//!          └──────────┬───────────┘      └──────────────────────┘
//!                     │ N scores
//!                     ▼
//!          ┌──────────────────────┐
//!          │  Stable sort, top K  │
//!          └──────────┬───────────┘
//!                     │
//!                     ▼
//!          ┌──────────────────────┐
//!          │  Vote by building    │
//!          │  score >= backup 0.4 │
//!          └──────────┬───────────┘
//!                     │ plurality: votes, best score, first vote
//!                     ▼
//!          ┌──────────────────────┐
//!          │  Tier                │
//!          │  confident  >= 0.7   │
//!          │  uncertain  >= 0.4   │
//!          │  no_match            │
//!          └──────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, snapshot location and classifier
//! - [`error`] - `CatalogLoadError` (startup-fatal) and `IdentifyError` (per request)
//! - [`models`] - Classification result and request/response types
//! - [`catalog`] - Immutable reference catalog and its validation
//! - [`catalog::snapshot`] - Versioned JSONL snapshots and `latest` resolution
//! - [`search::similarity`] - Cosine similarity and the exhaustive scan
//! - [`search::classifier`] - Top-K ranking, building votes and confidence tiers
//! - [`eval`] - Accuracy measurement over a labelled query set
//! - [`api`] - Axum HTTP handlers for identify, catalog info and reload
//! - [`state`] - Shared application state holding the swappable catalog

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod eval;
pub mod models;
pub mod search;
pub mod state;

//! Hypergraph knowledge store and attention-driven agent scheduler.
//!
//! Cogflare keeps knowledge as typed **atoms** in a persisted hypergraph:
//! named nodes, and links whose ordered outgoing sets point at other atoms.
//! Every atom carries a truth value and an attention value. A scheduler of
//! **mind agents** periodically reads and mutates the graph:
//!
//! | Agent | Every | Effect |
//! |-------|-------|--------|
//! | **Forget** | 30 s | Decays low-attention atoms and deletes the lowest |
//! | **ImportanceSpreading** | 10 s | Passes attention from busy atoms to their links |
//! | **Goal** | 5 s | Completes satisfied goals, keeps an implicit goal alive |
//! | **Hebbian** | 20 s | Placeholder |
//!
//! # Architecture
//!
//! - **Storage**: SQLite, one database file per named instance
//! - **Concurrency**: one actor per instance; atomspaces on a dedicated thread,
//!   schedulers as a tokio task driven by a due-time queue
//! - **Transport**: JSON over HTTP (axum), with a `{success, data|error, timestamp}` envelope
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization, schema, migrations, and health checks
//! - [`atomspace`]: The atom store and its per-instance actor
//! - [`mindagent`]: Agent registry, goal ledger, behaviors and the scheduler actor
//! - [`instances`]: Name → handle registry that activates instances on first use
//! - [`reasoning`]: Text completion client used by the reasoning endpoint
//! - [`server`]: HTTP routes, response envelope and error mapping

pub mod atomspace;
pub mod config;
pub mod db;
pub mod instances;
pub mod mindagent;
pub mod reasoning;
pub mod server;

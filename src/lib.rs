//! # Slot Poller
//!
//! A concurrent polling scheduler that watches an external booking resource
//! for free exam slots.
//!
//! A fixed set of `(date, address)` tasks is fed to a bounded pool of worker
//! threads on a steady cadence. Workers probe the resource, announce every
//! discovery once, and skip re-probing a found slot until its TTL lapses.
//! When the shared session credential expires, exactly one worker refreshes
//! it while the others wait for the result.
//!
//! ## Key Features
//!
//! - **Worker Threads**: dedicated OS threads, each with its own
//!   single-threaded tokio runtime for the async probe and notifier
//! - **TTL Dedup**: a found slot is neither re-probed nor re-announced until
//!   its TTL expires
//! - **Single-Flight Refresh**: concurrent expiries trigger one credential
//!   refresh; the gate resets for later expiries
//! - **Clean Shutdown**: cancellation closes the task channel and workers
//!   drain what is queued
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use slot_poller::builders::build_scheduler;
//! use slot_poller::config::PollerConfig;
//! use slot_poller::infra::NtfyNotifier;
//!
//! let cfg = PollerConfig::load("config.json".as_ref())?;
//! let notifier = Arc::new(NtfyNotifier::new(&cfg.ntfy_server, cfg.default_timeout())?);
//! let scheduler = build_scheduler(&cfg, notifier)?;
//!
//! let shutdown = scheduler.shutdown_handle();
//! // hand `shutdown` to a signal handler, then:
//! let stats = scheduler.run()?;
//! ```
//!
//! For complete scenarios, see `tests/scheduler_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core polling abstractions: tasks, credential gate, distributor, workers.
pub mod core;
/// Configuration models for the poller and its scheduler.
pub mod config;
/// Builders to construct the task set and scheduler from configuration.
pub mod builders;
/// Infrastructure adapters: HTTP probe, notifiers, credential storage.
pub mod infra;
/// Shared utilities.
pub mod util;

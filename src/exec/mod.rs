// src/exec/mod.rs

//! Process execution layer.
//!
//! This module owns the child processes of a session, using
//! `tokio::process::Command`, and turns their blocking output pipes into
//! non-blocking line queues.
//!
//! - [`pump`] provides [`StreamPump`], one background reader per stream.
//! - [`process`] provides [`ManagedProcess`], a child with piped stdio and a
//!   pump for stdout and stderr.
//! - [`peer`] provides the [`Peer`] trait the relay loop is written against,
//!   which `ManagedProcess` implements and tests can fake.

pub mod peer;
pub mod process;
pub mod pump;

pub use peer::Peer;
pub use process::ManagedProcess;
pub use pump::StreamPump;

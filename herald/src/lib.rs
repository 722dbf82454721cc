//! Herald: paced bulk-message dispatch over a recipient dataset.
//!
//! This crate wires the pieces together: it loads the dataset, owns the
//! process-backed delivery channel, forwards manual confirmations from
//! stdin, and writes the annotated export when the run settles.

pub mod channel;
pub mod controller;
pub mod notifier;

//! DSP — pure Rust building blocks of the software tone chain.
//!
//! These mirror the Web Audio nodes the browser backend uses, so the
//! AudioWorklet and native renderings sound like the node graph.

pub mod filter;
pub mod oscillator;
pub mod param;

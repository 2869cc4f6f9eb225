// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite State Machine Abstractions
//!
//! This module provides a small state machine trait for modeling protective
//! lifecycles. Transitions are pure functions with no side effects; the owner
//! of the state applies them under whatever synchronization it needs.
//!
//! # Mealy Machine
//!
//! Output depends on both current state and input:
//! ```text
//! (State, Input) → (State, Output)
//! ```
//!
//! # Design Principles
//!
//! 1. **Type Safety**: States are strongly typed enums
//! 2. **Pure Functions**: All transitions are pure
//! 3. **Total**: Every (state, input) pair has a defined result
//!
//! # Example
//!
//! ```rust
//! use outbox_relay::state_machine::StateMachine;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Switch {
//!     Off,
//!     On,
//! }
//!
//! struct Press;
//!
//! impl StateMachine for Switch {
//!     type Input = Press;
//!     type Output = ();
//!
//!     fn transition(&self, _input: &Press) -> (Self, ()) {
//!         match self {
//!             Switch::Off => (Switch::On, ()),
//!             Switch::On => (Switch::Off, ()),
//!         }
//!     }
//! }
//!
//! assert_eq!(Switch::Off.transition(&Press).0, Switch::On);
//! ```

pub mod circuit;

pub use circuit::{Admission, CircuitSignal, CircuitState};

/// Trait for finite state machines
///
/// Implement this trait to define a state machine with typed states,
/// inputs, and outputs.
pub trait StateMachine: Sized + Clone {
    /// Input type that triggers transitions
    type Input;

    /// Output type produced by transitions (use () if none)
    type Output;

    /// Compute the next state and output for an input
    fn transition(&self, input: &Self::Input) -> (Self, Self::Output);

    /// Whether an input moves the machine out of its current state
    fn changes_state(&self, input: &Self::Input) -> bool
    where
        Self: PartialEq,
    {
        self.transition(input).0 != *self
    }
}

//! Tests for the game engine, driven through [`apply`](super::apply).

#![cfg(test)]
#![allow(clippy::bool_assert_comparison)]

pub mod government;
pub mod policy_deck;

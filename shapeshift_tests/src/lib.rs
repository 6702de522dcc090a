/*! # Shapeshift tests

Shared test protocol and cross-crate integration tests for the shapeshift protocol.
*/
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod protocol;

#[cfg(test)]
mod entities;

#[cfg(test)]
mod envelopes;

#[cfg(test)]
mod references;

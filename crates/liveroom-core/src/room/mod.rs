//! Room aggregate: roster, entitlements, slot pointer and replay marks,
//! owned by one writer and mutated only through [`RoomState::apply`].

mod sequencer;
mod state;

#[cfg(test)]
mod tests;

pub use sequencer::Sequencer;
pub use state::{Effect, RoomState};

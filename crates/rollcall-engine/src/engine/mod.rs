//! Reaction-to-cell engine API.
//!
//! Pure, synchronous building blocks for the sync driver:
//!
//! - [`parse_range`], [`parse_column_label`] - A1 range notation codec
//! - [`CellRef`] - absolute zero-indexed sheet coordinates
//! - [`resolve_effective_colour`] - pick one colour from a user's reactions
//! - [`find_cell_for_name`] - locate a display name in fetched range values
//! - [`Rgb`] - hex colour decoding for formatting requests

mod cell_ref;
mod colour;
mod locate;
mod priority;
mod range;

pub use cell_ref::CellRef;
pub use colour::{ColourError, FALLBACK_COLOUR, Rgb};
pub use locate::{FetchedRange, LocateError, LocatedCell, Orientation, find_cell_for_name};
pub use priority::{
    EffectiveColour, PriorityTable, ReactionColour, UnknownReactionKind, resolve_effective_colour,
};
pub use range::{RangeError, RangeRef, find_ranges, parse_column_label, parse_range};

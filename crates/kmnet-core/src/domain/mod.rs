//! Domain entities for kmnet.
//!
//! This module contains pure logic with no infrastructure dependencies.
//!
//! # What lives here (for beginners)
//!
//! The box is stateless from the client's point of view: it executes whatever
//! report it receives.  All the bookkeeping that turns "press Shift, then
//! press H" into a sequence of complete reports happens on the client, and
//! that bookkeeping is what this module holds:
//!
//! - [`DeviceId`] – the identity printed on the box screen.
//! - [`MouseState`] / [`KeyboardState`] – the soft reports and their update
//!   rules.
//! - [`MaskState`] – which physical inputs the box should hide from the host.
//!
//! None of this touches a socket, so it can be tested on any machine.

pub mod device_id;
pub mod report_state;

pub use device_id::{DeviceId, DeviceIdError};
pub use report_state::{KeyboardState, MaskState, MaskTarget, MouseState};

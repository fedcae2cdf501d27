//! Effect systems.
//!
//! Each system owns its nodes and state, advances from the frame delta it is
//! given, and talks to the outside world only through a [`crate::host::SceneHost`].

pub mod embers;
pub mod fireflies;
pub mod leaves;
pub mod lens_flare;
pub mod random;
pub mod sun;
pub mod wind;

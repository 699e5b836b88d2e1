#![deny(unsafe_code)]
//! Metaball layers traced with marching squares.
//!
//! Each [`MetaballLayer`] moves a handful of [`Ball`]s inside a confinement
//! disk, samples their summed field on a [`Grid`] and walks one contour per
//! ball. A [`Lamp`] stacks any number of layers additively on one surface,
//! and [`FrameLoop`] drives it from a native [`FrameScheduler`].

pub mod ball;
pub mod grid;
pub mod lamp;
pub mod layer;
pub mod point;
pub mod scheduler;
pub mod tracer;

pub use ball::{Ball, BallId, Confinement};
pub use grid::{field_at, FieldSampler, FrameStamp, Grid};
pub use lamp::Lamp;
pub use layer::{MetaballLayer, TraceStats};
pub use point::Point;
pub use scheduler::{
    CancelHandle, FixedRate, FrameBudget, FrameLoop, FrameScheduler, LoopStats, ResizeEvent,
};
pub use tracer::{Contour, Direction, TraceOutcome};

//! Virtual CNC emulator
//!
//! Replays a G-code program into a [`Scene`]: either as a growing polyline
//! or by moving a marker object along the toolpath with timed keyframes.
//! A [`ModalOperator`] drives jogging and timed playback, and an optional
//! [`StockVolume`] is carved along cutting moves.

pub mod emulator;
pub mod export;
pub mod interpolation;
pub mod operator;
pub mod scene;
pub mod stock;

pub use emulator::{interpreter_options, VirtualCnc};
pub use export::{polyline_to_svg, SceneSnapshot};
pub use interpolation::{trace_points, TracePoint};
pub use operator::{JogDirection, ModalOperator, OperatorCommand, OperatorEvent, OperatorStatus};
pub use scene::{Keyframe, Scene, SceneRecorder};
pub use stock::StockVolume;

//! # attitude-manager
//! A `#![no_std]` attitude manager for fixed-wing autopilots
//!
//! The [`AttitudeManager`] is a tick-driven state machine that pulls instructions from a path manager,
//! fuses the sensors into an attitude estimate, runs one PID loop per axis, mixes the result into
//! actuator channels and hands them to a safety processor.
//!
//! # Components
//! [`attitude`] contains the state machine and its data types.
//!
//! [`hal`] contains the hardware abstraction layer and sensor drivers
//! (see [`Airspeed`](hal::Airspeed) for the differential-pressure airspeed sensor).
//!
//! [`pid`], [`filter`] and [`mixing`] contain the control building blocks.
//!
//! [`scheduler`] contains the fixed-rate [`TickDriver`].
//!
//! # Logging
//! Enable the `defmt` feature to log state changes, degraded sensors and faults with `defmt`.

#![no_std]

mod log;

pub mod attitude;
pub use attitude::{AttitudeManager, StateId};

pub mod config;
pub use config::AttitudeConfig;

pub mod error;
pub use error::Fault;

pub mod filter;

pub mod hal;
pub use hal::{PathSource, SafetySink, Sensors};

pub mod mixing;
pub use mixing::MixingMatrix;

pub mod pid;
pub use pid::{PidController, PidGains};

pub mod scheduler;
pub use scheduler::TickDriver;

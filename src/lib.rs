//! SOS Beacon - an in-memory coordination engine for disaster response.
//!
//! # Overview
//!
//! Victims submit SOS signals with location, message and battery data; a
//! command dashboard triages them, maps danger zones and dispatches
//! simulated rescue teams; a background ticker moves assigned teams toward
//! victims and retires rescued incidents.
//!
//! All state is volatile and process-local by design: this is a
//! coordination demo engine, not a system of record. The one correctness
//! property it does guarantee is serialized store access: the HTTP
//! dispatch path and the simulation ticker never race on the collections.
//!
//! # Modules
//!
//! - [`model`]: SOS signals, rescue teams, danger zones and wire types
//! - [`store`]: the shared in-memory incident store
//! - [`triage`]: keyword-tier classification of SOS messages
//! - [`geo`]: Haversine distance and proximity-alert rules
//! - [`dispatch`]: triage/dispatch orchestration and the status state machine
//! - [`ticker`]: the periodic rescue simulation loop
//! - [`api`]: HTTP API handlers

pub mod api;
pub mod dispatch;
pub mod geo;
pub mod model;
pub mod store;
pub mod ticker;
pub mod triage;

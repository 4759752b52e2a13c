//! Integration tests: full service wiring over in-memory stores and the
//! real trigger runtime.

mod helpers;
mod schedule_test;
mod state_event_test;

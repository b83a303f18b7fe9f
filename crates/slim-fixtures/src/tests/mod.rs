//! Behavioural suites for the fixture crate.

mod conversion_behaviour;

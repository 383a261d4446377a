//! In-process event notification

mod bus;

pub use bus::EventBus;

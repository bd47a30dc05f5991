pub mod calendar;
pub mod clock;
pub mod control_loop;
pub mod device;
pub mod formatter;
pub mod registry;
pub mod time_sync;

pub mod age;
pub mod instant;
pub mod person;
pub mod settings;
pub mod time_sync;

pub use age::*;
pub use instant::*;
pub use person::*;
pub use settings::*;
pub use time_sync::*;

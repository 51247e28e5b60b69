pub mod bus;
pub mod error;
pub mod memory;
pub mod redis_bus;

pub use bus::{MessageStream, NotificationBus, NotificationBusExt, PayloadStream};
pub use error::MqError;
pub use memory::MemoryBus;
pub use redis_bus::RedisBus;

pub mod consumer;
pub mod kafka_consumer;
pub mod notification;

pub use consumer::{EventConsumer, MessageConsumer, MessageHandler};
pub use kafka_consumer::KafkaConsumer;
pub use notification::{NotificationService, ProductEventHandler};

pub mod kafka_producer;
pub mod products;

pub use kafka_producer::KafkaProducer;
pub use products::{MessageBroker, ProductsService};

pub mod catalog;
pub mod database;
pub mod events;
pub mod metrics;
pub mod orders;

pub use catalog::CatalogClient;
pub use database::Database;
pub use events::{EventPublisher, KafkaEventPublisher, NullEventPublisher};
pub use metrics::{get_metrics, init_metrics};
pub use orders::{EventOutcome, OrderWorkflow};

pub mod database;
pub mod metrics;

pub use self::database::{ContactWrite, PersonDb};
pub use self::metrics::{get_metrics, init_metrics};

pub mod dispatcher;
pub mod pool;

pub use dispatcher::Dispatcher;
pub use pool::{PoolConfig, StopToken, WorkerPool};

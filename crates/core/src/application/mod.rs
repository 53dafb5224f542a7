// Application Layer - The supervisor use case

pub mod supervisor;

// Re-exports
pub use supervisor::{shutdown_channel, ShutdownSender, ShutdownToken, Supervisor};

pub mod batch_handler;
pub mod probe_handler;

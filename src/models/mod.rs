pub mod probe_result;
pub mod scan_result;

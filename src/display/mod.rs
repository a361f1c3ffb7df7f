//! Display formatting for terminal output
//!
//! Provides utilities for formatting audit histories and change sets as
//! plain-text tables.

pub mod changes;
pub mod record;

pub use changes::{format_change_set, format_flat_map};
pub use record::{format_history, format_record_details};

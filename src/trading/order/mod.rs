pub mod signal_order;

pub use signal_order::{OrderOutcome, SignalOrder};

pub mod coze;

pub use coze::{build_client, ChatOutcome, CozeProvider};

pub mod coze;

pub use coze::{
    ChatRequestPayload, ChatResponse, CozeMessage, ErrorBody, FileInfo, ProxySuccess,
    QueryPayload, StreamEvent,
};

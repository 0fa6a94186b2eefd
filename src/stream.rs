//! Coze 流式响应聚合
//!
//! 按块读取 `text/event-stream` 响应体，逐行解析 `data:` 事件，
//! 把 type 为 answer 的消息片段拼接成完整回答。
//!
//! 行可能被切分在两个块之间（包括 UTF-8 多字节字符），
//! 因此未以换行结尾的尾部会缓存到下一个块再处理。
//! 缓存的半行超过上限时整行作为无效数据丢弃。

use crate::models::coze::StreamEvent;

const DATA_PREFIX: &str = "data:";

/// 单行最大缓存字节数
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// 单行处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// 追加了 answer 片段
    Answer,
    /// 合法事件但没有 answer 内容，或非 data 行
    Ignored,
    /// data 行的 JSON 无法解析，已丢弃
    Malformed,
}

/// 流结束后的聚合结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedAnswer {
    pub content: String,
    /// 仅记录，不返回给调用方
    pub conversation_id: Option<String>,
}

#[derive(Debug)]
pub struct AnswerAggregator {
    pending: Vec<u8>,
    max_line_bytes: usize,
    /// 正在跳过超长行的剩余部分
    discarding: bool,
    answer: String,
    conversation_id: Option<String>,
    malformed_lines: usize,
}

impl Default for AnswerAggregator {
    fn default() -> Self {
        Self::with_line_limit(MAX_LINE_BYTES)
    }
}

impl AnswerAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_limit(max_line_bytes: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line_bytes,
            discarding: false,
            answer: String::new(),
            conversation_id: None,
            malformed_lines: 0,
        }
    }

    /// 处理一个原始字节块中所有完整的行
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        let mut chunk = chunk;
        if self.discarding {
            let Some(pos) = chunk.iter().position(|&b| b == b'\n') else {
                return;
            };
            self.discarding = false;
            chunk = &chunk[pos + 1..];
        }
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let line = String::from_utf8_lossy(&self.pending[start..end]).into_owned();
            self.process_line(&line);
            start = end + 1;
        }
        self.pending.drain(..start);

        if self.pending.len() > self.max_line_bytes {
            tracing::warn!(
                "[STREAM] 单行超过 {} 字节仍未结束，丢弃该行",
                self.max_line_bytes
            );
            self.pending.clear();
            self.malformed_lines += 1;
            self.discarding = true;
        }
    }

    /// 处理单行文本
    pub fn process_line(&mut self, line: &str) -> LineOutcome {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some(data) = line.strip_prefix(DATA_PREFIX) else {
            return LineOutcome::Ignored;
        };
        let data = data.strip_prefix(' ').unwrap_or(data);

        let event: StreamEvent = match serde_json::from_str(data) {
            Ok(event) => event,
            Err(e) => {
                self.malformed_lines += 1;
                tracing::debug!("[STREAM] 丢弃无法解析的行: {} ({})", data, e);
                return LineOutcome::Malformed;
            }
        };

        if let Some(conversation_id) = &event.conversation_id {
            self.conversation_id = Some(conversation_id.clone());
        }

        match event.answer_fragment() {
            Some(fragment) => {
                self.answer.push_str(fragment);
                LineOutcome::Answer
            }
            None => LineOutcome::Ignored,
        }
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn malformed_lines(&self) -> usize {
        self.malformed_lines
    }

    /// 流结束：处理缓存的最后一行，回答为空时返回 None
    pub fn finish(mut self) -> Option<AggregatedAnswer> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            let line = String::from_utf8_lossy(&rest).into_owned();
            self.process_line(&line);
        }

        if self.malformed_lines > 0 {
            tracing::debug!("[STREAM] 共丢弃 {} 行无效数据", self.malformed_lines);
        }

        if self.answer.is_empty() {
            return None;
        }

        Some(AggregatedAnswer {
            content: self.answer,
            conversation_id: self.conversation_id,
        })
    }
}

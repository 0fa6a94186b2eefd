//! 上传文件接收
//!
//! 把 multipart 中的文件字段按块写入临时文件，边写边检查大小限制。
//! 临时文件随 `UploadedFile` 一起释放，任何退出路径都会删除。

use std::path::Path;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::error::ProxyError;
use crate::models::coze::FileInfo;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
const TEMP_FILE_PREFIX: &str = "coze-upload-";

/// 单次请求中上传的文件
#[derive(Debug)]
pub struct UploadedFile {
    pub original_filename: String,
    pub mime_type: String,
    pub size: u64,
    temp: NamedTempFile,
}

impl UploadedFile {
    /// 临时文件路径
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.temp.path()).await
    }

    /// 读取文件并转换为 Coze 所需的文件信息
    pub async fn to_file_info(&self) -> std::io::Result<FileInfo> {
        let bytes = self.read_bytes().await?;
        Ok(FileInfo {
            file_name: self.original_filename.clone(),
            file_content_base64: encode_data_uri(&self.mime_type, &bytes),
            file_type: self.mime_type.clone(),
        })
    }
}

/// `data:<mime>;base64,<内容>`
pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// 从 multipart 请求体中读取指定字段的文件
///
/// 非目标字段会被跳过；目标字段没有文件名时视为普通表单字段。
pub async fn receive_upload(
    multipart: &mut Multipart,
    field_name: &str,
    max_file_size: Option<u64>,
) -> Result<UploadedFile, ProxyError> {
    receive_upload_in(multipart, field_name, max_file_size, &std::env::temp_dir()).await
}

/// 同 [`receive_upload`]，临时文件创建在 `temp_dir` 中
pub async fn receive_upload_in(
    multipart: &mut Multipart,
    field_name: &str,
    max_file_size: Option<u64>,
    temp_dir: &Path,
) -> Result<UploadedFile, ProxyError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_size))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let Some(original_filename) = field.file_name().map(str::to_string) else {
            tracing::debug!("[UPLOAD] 字段 {} 没有文件名，跳过", field_name);
            continue;
        };
        let mime_type = field
            .content_type()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();

        let temp = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile_in(temp_dir)?;
        let mut writer = tokio::fs::File::from_std(temp.as_file().try_clone()?);
        let mut size = 0u64;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, max_file_size))?
        {
            size += chunk.len() as u64;
            if let Some(limit) = max_file_size {
                if size > limit {
                    tracing::warn!(
                        "[UPLOAD] 文件 {} 超过大小限制 ({} > {})",
                        original_filename,
                        size,
                        limit
                    );
                    return Err(ProxyError::FileTooLarge { limit });
                }
            }
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;

        if size == 0 {
            return Err(ProxyError::EmptyFile);
        }

        tracing::info!(
            "[UPLOAD] 已接收文件: name={}, type={}, size={}",
            original_filename,
            mime_type,
            size
        );

        return Ok(UploadedFile {
            original_filename,
            mime_type,
            size,
            temp,
        });
    }

    Err(ProxyError::MissingFile)
}

fn multipart_error(err: MultipartError, max_file_size: Option<u64>) -> ProxyError {
    match max_file_size {
        Some(limit) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            ProxyError::FileTooLarge { limit }
        }
        _ => ProxyError::InvalidMultipart(err.body_text()),
    }
}

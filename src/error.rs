// ============================================
// src/error.rs
// エラー型
// ============================================

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// 設定ファイルの読み書きエラー
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to encode preferences: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to serialize preferences: {0}")]
    Json(#[from] serde_json::Error),
}

/// 漢字 → ひらがな 変換のエラー (利用者には見せない)
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    #[error("analyzer initialization failed: {0}")]
    Initialization(String),

    #[error("conversion failed: {0}")]
    Failed(String),
}

/// 音声認識のエラー。メッセージはそのまま画面に出す
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("マイクのアクセス許可が必要です")]
    NotAllowed,

    #[error("音声が検出されませんでした")]
    NoSpeech,

    #[error("インターネット接続を確認してください")]
    Network,

    /// 利用者が止めた (エラー扱いしない)
    #[error("音声認識を中止しました")]
    Aborted,

    #[error("音声認識を開始できませんでした")]
    StartFailed(String),

    #[error("音声認識エラーが発生しました")]
    Unknown(String),
}

impl RecognitionError {
    /// 画面に出すべきエラーか
    pub fn is_reportable(&self) -> bool {
        !matches!(self, RecognitionError::Aborted)
    }
}

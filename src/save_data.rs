// ============================================
// src/save_data.rs
// 設定 (入力方法) の保存と読み込み
// ============================================

use bincode::config::standard;
use bincode::{Decode, Encode};
use chrono::{DateTime, TimeZone, Utc};
use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use std::fs;
use std::path::PathBuf;

use crate::error::PreferenceError;

/// 設定ファイルのキー (ファイル名になる)
pub const PREFERENCE_KEY: &str = "kanji-quiz.input-mode";

/// 答えの入力方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// キーボード (保存がないときはこれ)
    #[default]
    Text,
    Voice,
}

impl InputMode {
    pub fn toggled(self) -> Self {
        match self {
            InputMode::Text => InputMode::Voice,
            InputMode::Voice => InputMode::Text,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputMode::Text => "キーボード",
            InputMode::Voice => "音声",
        }
    }
}

/// 保存する設定
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub input_mode: InputMode,
    /// 最後に変更した日時
    pub updated_at: Option<DateTime<Utc>>,
}

/// bincode用の内部表現
#[derive(Encode, Decode)]
struct PreferencesBin {
    input_mode: u8,
    updated_at_secs: Option<i64>,
}

impl From<&Preferences> for PreferencesBin {
    fn from(prefs: &Preferences) -> Self {
        Self {
            input_mode: match prefs.input_mode {
                InputMode::Text => 0,
                InputMode::Voice => 1,
            },
            updated_at_secs: prefs.updated_at.map(|t| t.timestamp()),
        }
    }
}

impl From<PreferencesBin> for Preferences {
    fn from(bin: PreferencesBin) -> Self {
        Self {
            input_mode: match bin.input_mode {
                1 => InputMode::Voice,
                _ => InputMode::Text,
            },
            updated_at: bin
                .updated_at_secs
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }
}

/// 設定の保存先
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    dir: PathBuf,
}

impl PreferenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// OSごとのデータ保存用ディレクトリ
    pub fn default_dir() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("jp", "Fukumoto0141", "KANJI_QUIZ") {
            return proj_dirs.data_dir().to_path_buf();
        }
        // 取得できなかったらカレントディレクトリに
        PathBuf::from(".")
    }

    #[cfg(test)]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn bin_path(&self) -> PathBuf {
        self.dir.join(format!("{PREFERENCE_KEY}.bin"))
    }

    fn json_path(&self) -> PathBuf {
        self.dir.join(format!("{PREFERENCE_KEY}.json"))
    }

    /// MARK:設定を保存する (バイナリ + JSON)
    pub fn save(&self, prefs: &Preferences) -> Result<(), PreferenceError> {
        fs::create_dir_all(&self.dir).map_err(|source| PreferenceError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        // --- 1. バイナリ形式で保存 (本番用) ---
        let path = self.bin_path();
        let encoded = bincode::encode_to_vec(PreferencesBin::from(prefs), standard())?;
        fs::write(&path, encoded).map_err(|source| PreferenceError::Write { path, source })?;

        // --- 2. JSON形式で保存 (確認用) ---
        let path = self.json_path();
        let json = serde_json::to_string_pretty(prefs)?;
        fs::write(&path, json).map_err(|source| PreferenceError::Write { path, source })?;

        Ok(())
    }

    /// MARK:設定を読み込む (バイナリ優先、JSONフォールバック、なければデフォルト)
    pub fn load(&self) -> Preferences {
        // 1. バイナリファイルから読み込みを試行
        if let Ok(buffer) = fs::read(self.bin_path()) {
            match bincode::decode_from_slice::<PreferencesBin, _>(&buffer, standard()) {
                Ok((bin, _)) => return Preferences::from(bin),
                Err(e) => tracing::warn!(error = %e, "preference file is corrupt"),
            }
        }

        // 2. JSONファイルから読み込みを試行
        if let Ok(json) = fs::read_to_string(self.json_path()) {
            match serde_json::from_str(&json) {
                Ok(prefs) => return prefs,
                Err(e) => tracing::warn!(error = %e, "preference json is corrupt"),
            }
        }

        // どちらもなければデフォルト
        Preferences::default()
    }

    /// 入力方法を変更して保存する
    pub fn set_input_mode(&self, mode: InputMode) -> Result<Preferences, PreferenceError> {
        let prefs = Preferences {
            input_mode: mode,
            updated_at: Some(Utc::now()),
        };
        self.save(&prefs)?;
        tracing::info!(?mode, "input mode saved");
        Ok(prefs)
    }
}

// ============================================
// src/speech_command.rs
// 外部コマンドで音声認識する
// ============================================

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::RecognitionError;
use crate::voice::{SpeechCapability, StopSignal};

/// 認識コマンドに言語を渡す環境変数
pub const LOCALE_ENV: &str = "KANJI_QUIZ_LOCALE";

// 認識コマンドの終了コード (sysexits.h)
const EXIT_NOPERM: i32 = 77;
const EXIT_UNAVAILABLE: i32 = 69;

/// 1回実行するごとに1発話を認識し、標準出力に結果を出すコマンド
///
/// 終了コード 0 で認識結果、77 でマイク権限なし、69 で接続エラー。
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSpeech {
    /// コマンドが見つからなければ None (音声入力は使えない)
    pub fn detect(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        let Some(resolved) = resolve_program(program) else {
            tracing::warn!(program, "speech recognizer command not found");
            return None;
        };
        Some(Self {
            program: resolved,
            args: parts.map(String::from).collect(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// PATH からプログラムを探す
fn resolve_program(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        let with_suffix = dir.join(format!("{program}{}", std::env::consts::EXE_SUFFIX));
        with_suffix.is_file().then_some(with_suffix)
    })
}

/// 終了コードと出力を認識結果に振り分ける
fn classify(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Result<String, RecognitionError> {
    match code {
        Some(0) => {
            let text = String::from_utf8_lossy(stdout).trim().to_string();
            if text.is_empty() {
                Err(RecognitionError::NoSpeech)
            } else {
                Ok(text)
            }
        }
        Some(EXIT_NOPERM) => Err(RecognitionError::NotAllowed),
        Some(EXIT_UNAVAILABLE) => Err(RecognitionError::Network),
        Some(code) => Err(RecognitionError::Unknown(format!(
            "exit status {code}: {}",
            String::from_utf8_lossy(stderr).trim()
        ))),
        None => Err(RecognitionError::Unknown("terminated by signal".into())),
    }
}

#[async_trait]
impl SpeechCapability for CommandSpeech {
    async fn recognize(&self, locale: &str, stop: StopSignal) -> Result<String, RecognitionError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .env(LOCALE_ENV, locale)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // 止めたときに子プロセスも終わらせる
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RecognitionError::StartFailed(e.to_string()))?;

        tokio::select! {
            output = child.wait_with_output() => {
                let output = output.map_err(|e| RecognitionError::Unknown(e.to_string()))?;
                classify(output.status.code(), &output.stdout, &output.stderr)
            }
            _ = stop => Err(RecognitionError::Aborted),
        }
    }
}

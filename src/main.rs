// ============================================
// src/main.rs (メインファイル)
// ============================================

use std::fs::{self, File, OpenOptions};
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use console::Term;
use crossterm::{
    ExecutableCommand,
    cursor::{Hide, Show},
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

mod app;
mod error;
mod hiragana;
mod phonetic;
mod plain;
mod questions;
mod quiz;
mod save_data;
mod speech_command;
mod ui;
mod voice;

use app::{App, SubmitPolicy};
use phonetic::PhoneticConverter;
use questions::{BuiltinKanji, GradeScope};
use quiz::{COUNT_CHOICES, QuizGame};
use save_data::{InputMode, PreferenceStore};
use speech_command::CommandSpeech;
use voice::{SpeechCapability, VoiceCapture};

const LOG_FILE: &str = "kanji-quiz.log";

// --------------------------------------------------
// コマンドライン引数
// --------------------------------------------------

/// 小学3・4年生の漢字の読みクイズ
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// 学年 (3, 4, both)。指定すると学年選択をとばす
    #[arg(long)]
    grade: Option<GradeScope>,

    /// もんだいの数 (10 か 20)。--grade といっしょに使う
    #[arg(long, requires = "grade", value_parser = parse_count)]
    count: Option<usize>,

    /// 入力方法を変更して保存する
    #[arg(long, value_enum)]
    input_mode: Option<InputMode>,

    /// 音声認識に使うコマンド (1回の実行で1つの発話を標準出力に出す)
    #[arg(long)]
    speech_command: Option<String>,

    /// 音声の認識結果を1秒後に自動で送信する
    #[arg(long)]
    auto_submit: bool,

    /// 画面を使わず1行ずつ出題する
    #[arg(long)]
    plain: bool,

    /// 設定とログの保存先
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn parse_count(s: &str) -> Result<usize, String> {
    let count: usize = s.parse().map_err(|_| format!("`{s}` は数ではありません"))?;
    if COUNT_CHOICES.contains(&count) {
        Ok(count)
    } else {
        Err(format!("もんだいの数は {COUNT_CHOICES:?} から選んでください"))
    }
}

// --------------------------------------------------
// メイン関数 (TUIセットアップと実行ループ)
// --------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(PreferenceStore::default_dir);
    // ログが書けなくてもクイズは遊べる
    if let Err(e) = init_logging(&data_dir) {
        eprintln!("warning: logging disabled: {e:#}");
    }
    tracing::info!(data_dir = %data_dir.display(), "starting kanji quiz");

    let runtime = Runtime::new().context("failed to start async runtime")?;

    // 保存した入力方法 (引数で指定されたら上書きして保存)
    let store = PreferenceStore::new(&data_dir);
    let mut input_mode = store.load().input_mode;
    if let Some(mode) = cli.input_mode {
        input_mode = mode;
        if let Err(e) = store.set_input_mode(mode) {
            tracing::warn!(error = %e, "failed to save input mode");
        }
    }

    let source = BuiltinKanji;
    let mut game = QuizGame::new(&source);

    if cli.plain || !Term::stdout().is_term() {
        let preset = cli.grade.zip(cli.count);
        return plain::run(&mut game, preset);
    }

    // 音声認識 (コマンドが見つからなければ使えない)
    let speech = cli
        .speech_command
        .as_deref()
        .and_then(CommandSpeech::detect)
        .map(|speech| {
            tracing::info!(program = %speech.program().display(), "speech recognizer found");
            Arc::new(speech) as Arc<dyn SpeechCapability>
        });

    // 読みの辞書はバックグラウンドで読み込む
    let converter = PhoneticConverter::from_builtin();
    {
        let converter = converter.clone();
        runtime.spawn(async move {
            if let Err(e) = converter.initialize().await {
                tracing::warn!(error = %e, "reading conversion unavailable");
            }
        });
    }

    let voice = VoiceCapture::new(speech, Some(converter), runtime.handle().clone());
    let policy = if cli.auto_submit {
        SubmitPolicy::AutoSubmit
    } else {
        SubmitPolicy::Confirm
    };
    let mut app = App::new(game, voice, Some(store), input_mode, policy);

    if let Some(grade) = cli.grade {
        app.select_grade(grade);
        if let Some(count) = cli.count {
            app.start_quiz(count);
        }
    }

    let mut terminal = setup_terminal().context("failed to set up terminal")?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal().context("failed to restore terminal")?;
    tracing::info!("bye");
    result
}

/// 画面は TUI が使うので、ログはファイルに出す
fn init_logging(dir: &Path) -> Result<()> {
    let file = open_log_file(dir)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kanji_quiz=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn open_log_file(dir: &Path) -> Result<File> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create data directory {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

fn setup_terminal() -> std::io::Result<Terminal<impl Backend>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?; // 代替スクリーンを使用
    stdout().execute(Hide)?; // カーソルを非表示
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

fn restore_terminal() -> std::io::Result<()> {
    stdout().execute(Show)?; // カーソルを再表示
    stdout().execute(LeaveAlternateScreen)?; // 代替スクリーンを終了
    disable_raw_mode()
}

fn run_app(terminal: &mut Terminal<impl Backend>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key, Instant::now());
                }
            }
        }

        // タイマーと音声の結果
        app.tick(Instant::now());
        if app.should_quit() {
            break;
        }
    }
    Ok(())
}

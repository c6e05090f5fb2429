// ============================================
// src/app.rs
// 画面の状態 (入力欄・タイマー・音声入力) とキー操作
// ============================================

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::questions::GradeScope;
use crate::quiz::{COUNT_CHOICES, GameState, Phase, QuizGame};
use crate::save_data::{InputMode, PreferenceStore};
use crate::voice::{VoiceCapture, VoiceUpdate};

/// 正解/不正解の表示を自動で閉じるまで
pub const FEEDBACK_DELAY: Duration = Duration::from_millis(1500);
/// 音声の認識結果を自動で送信するまで (結果を確認する時間)
pub const AUTO_SUBMIT_DELAY: Duration = Duration::from_millis(1000);

/// 音声の認識結果をどう送信するか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPolicy {
    /// 入力欄に入れて、Enter で送信
    #[default]
    Confirm,
    /// 少し待ってから自動で送信
    AutoSubmit,
}

/// アプリ全体の状態を管理する
pub struct App<'a> {
    game: QuizGame<'a>,
    voice: VoiceCapture,
    store: Option<PreferenceStore>,
    input_mode: InputMode,
    submit_policy: SubmitPolicy,

    /// 入力中の答え
    input: String,
    /// 音声入力で入力欄に入れた文字列 (利用者が書き換えていなければ同じ)
    voice_text: Option<String>,
    /// 一時的なお知らせ (音声認識エラーなど)
    notice: Option<String>,

    grade_cursor: usize,
    count_cursor: usize,

    feedback_deadline: Option<Instant>,
    auto_submit_deadline: Option<Instant>,
    should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(
        game: QuizGame<'a>,
        voice: VoiceCapture,
        store: Option<PreferenceStore>,
        input_mode: InputMode,
        submit_policy: SubmitPolicy,
    ) -> Self {
        // 音声が使えなければキーボードだけ
        let input_mode = if voice.is_supported() {
            input_mode
        } else {
            InputMode::Text
        };

        let mut app = Self {
            game,
            voice,
            store,
            input_mode,
            submit_policy,
            input: String::new(),
            voice_text: None,
            notice: None,
            grade_cursor: 0,
            count_cursor: 0,
            feedback_deadline: None,
            auto_submit_deadline: None,
            should_quit: false,
        };
        app.sync_voice_enabled();
        app
    }

    pub fn state(&self) -> &GameState<'a> {
        self.game.state()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn voice(&self) -> &VoiceCapture {
        &self.voice
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn grade_cursor(&self) -> usize {
        self.grade_cursor
    }

    pub fn count_cursor(&self) -> usize {
        self.count_cursor
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn auto_submit_pending(&self) -> bool {
        self.auto_submit_deadline.is_some()
    }

    // --------------------------------------------------
    // 操作
    // --------------------------------------------------

    pub fn select_grade(&mut self, grade: GradeScope) -> bool {
        self.game.select_grade(grade)
    }

    pub fn start_quiz(&mut self, count: usize) -> bool {
        let started = self.game.start_quiz(count);
        if started {
            self.clear_input();
            self.sync_voice_enabled();
        }
        started
    }

    /// 入力欄の答えを送信する。空なら何もしない
    pub fn submit_input(&mut self, now: Instant) -> bool {
        let answer = self
            .input
            .trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
            .to_string();
        if answer.is_empty() {
            return false;
        }
        if !self.game.submit_answer(answer) {
            return false;
        }
        self.clear_input();
        self.auto_submit_deadline = None;
        self.feedback_deadline = Some(now + FEEDBACK_DELAY);
        self.sync_voice_enabled();
        true
    }

    pub fn dismiss_feedback(&mut self) -> bool {
        if !self.game.dismiss_feedback() {
            return false;
        }
        self.feedback_deadline = None;
        self.notice = None;
        self.clear_input();
        self.sync_voice_enabled();
        true
    }

    /// 最初からやり直す
    pub fn reset(&mut self) {
        self.game.reset();
        self.clear_input();
        self.notice = None;
        self.feedback_deadline = None;
        self.auto_submit_deadline = None;
        self.grade_cursor = 0;
        self.count_cursor = 0;
        self.voice.reset();
        self.sync_voice_enabled();
    }

    /// キーボード ⇔ 音声 を切り替えて保存する
    pub fn toggle_input_mode(&mut self) {
        if !self.voice.is_supported() {
            tracing::debug!("voice input unsupported, staying in text mode");
            return;
        }
        self.input_mode = self.input_mode.toggled();
        if self.input_mode == InputMode::Text {
            self.voice.stop();
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.set_input_mode(self.input_mode) {
                tracing::warn!(error = %e, "failed to save input mode");
            }
        }
    }

    /// 録音の開始/停止
    pub fn toggle_listening(&mut self) -> bool {
        if self.input_mode != InputMode::Voice || !self.state().accepts_answer() {
            return false;
        }
        if self.voice.is_listening() {
            self.voice.stop()
        } else {
            self.notice = None;
            self.auto_submit_deadline = None;
            self.voice.start()
        }
    }

    pub fn quit(&mut self) {
        self.voice.reset();
        self.should_quit = true;
    }

    // --------------------------------------------------
    // タイマー・音声の結果
    // --------------------------------------------------

    /// ループのたびに呼ぶ
    pub fn tick(&mut self, now: Instant) {
        for update in self.voice.poll() {
            self.apply_voice_update(update, now);
        }

        if self.feedback_deadline.is_some_and(|deadline| now >= deadline) {
            self.dismiss_feedback();
        }

        if self.auto_submit_deadline.is_some_and(|deadline| now >= deadline) {
            self.auto_submit_deadline = None;
            self.submit_input(now);
        }
    }

    fn apply_voice_update(&mut self, update: VoiceUpdate, now: Instant) {
        if !self.state().accepts_answer() {
            return;
        }
        match update {
            VoiceUpdate::Transcript { text, converted } => {
                // 変換結果は、利用者が書き換えていないときだけ差し替える
                if converted && self.voice_text.as_deref() != Some(self.input.as_str()) {
                    return;
                }
                self.input = text.clone();
                self.voice_text = Some(text);
                if self.submit_policy == SubmitPolicy::AutoSubmit
                    && self.auto_submit_deadline.is_none()
                {
                    self.auto_submit_deadline = Some(now + AUTO_SUBMIT_DELAY);
                }
            }
            VoiceUpdate::Error(e) => {
                self.notice = Some(e.to_string());
            }
            VoiceUpdate::Stopped => {}
        }
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.voice_text = None;
    }

    /// 回答を受け付けていないときは音声入力を止める
    fn sync_voice_enabled(&mut self) {
        let accepting = self.state().accepts_answer();
        self.voice.set_enabled(accepting);
    }

    // --------------------------------------------------
    // キー入力
    // --------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            self.quit();
            return;
        }
        // Ctrl+R はどの画面からでも最初にもどる
        if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.reset();
            return;
        }

        let phase = self.state().phase;
        let show_feedback = self.state().show_feedback;
        match phase {
            Phase::SelectingGrade => self.handle_grade_key(key.code),
            Phase::ChoosingCount => self.handle_count_key(key.code),
            Phase::Playing if show_feedback => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.dismiss_feedback();
                }
            }
            Phase::Playing => self.handle_answer_key(key.code, now),
            Phase::Finished => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char('r')) {
                    self.reset();
                }
            }
        }
    }

    fn handle_grade_key(&mut self, code: KeyCode) {
        let choices = GradeScope::ALL;
        match code {
            KeyCode::Up => self.grade_cursor = self.grade_cursor.saturating_sub(1),
            KeyCode::Down => self.grade_cursor = (self.grade_cursor + 1).min(choices.len() - 1),
            KeyCode::Char(c @ '1'..='3') => {
                let idx = c as usize - '1' as usize;
                self.grade_cursor = idx;
                self.select_grade(choices[idx]);
            }
            KeyCode::Enter => {
                self.select_grade(choices[self.grade_cursor]);
            }
            _ => {}
        }
    }

    fn handle_count_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Up => self.count_cursor = self.count_cursor.saturating_sub(1),
            KeyCode::Right | KeyCode::Down => {
                self.count_cursor = (self.count_cursor + 1).min(COUNT_CHOICES.len() - 1)
            }
            KeyCode::Enter => {
                self.start_quiz(COUNT_CHOICES[self.count_cursor]);
            }
            // 学年選択にもどる
            KeyCode::Backspace => self.reset(),
            _ => {}
        }
    }

    fn handle_answer_key(&mut self, code: KeyCode, now: Instant) {
        match code {
            KeyCode::Char(c) => {
                self.input.push(c);
                self.auto_submit_deadline = None; // 書き換えたら自動送信しない
                self.notice = None;
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.auto_submit_deadline = None;
            }
            KeyCode::Enter => {
                self.submit_input(now);
            }
            KeyCode::Tab => self.toggle_input_mode(),
            KeyCode::F(2) => {
                self.toggle_listening();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConversionError, RecognitionError};
    use crate::phonetic::{PhoneticConverter, ReadingAnalyzer};
    use crate::questions::BuiltinKanji;
    use crate::voice::{SpeechCapability, StopSignal};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use tokio::runtime::Handle;

    static SOURCE: BuiltinKanji = BuiltinKanji;

    /// 決まった言葉を「話す」
    struct Speaks(Result<String, RecognitionError>);

    #[async_trait]
    impl SpeechCapability for Speaks {
        async fn recognize(&self, _locale: &str, _stop: StopSignal) -> Result<String, RecognitionError> {
            self.0.clone()
        }
    }

    struct Gated {
        gate: Mutex<std::sync::mpsc::Receiver<()>>,
        output: String,
    }

    impl ReadingAnalyzer for Gated {
        fn to_hiragana(&self, _text: &str) -> Result<String, ConversionError> {
            let _ = self.gate.lock().unwrap().recv();
            Ok(self.output.clone())
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App<'_>, text: &str, now: Instant) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)), now);
        }
    }

    fn text_app() -> App<'static> {
        let voice = VoiceCapture::new(None, None, Handle::current());
        App::new(QuizGame::new(&SOURCE), voice, None, InputMode::Text, SubmitPolicy::Confirm)
    }

    fn voice_app(
        speech: impl SpeechCapability + 'static,
        converter: Option<PhoneticConverter>,
        policy: SubmitPolicy,
    ) -> App<'static> {
        let speech: Arc<dyn SpeechCapability> = Arc::new(speech);
        let voice = VoiceCapture::new(Some(speech), converter, Handle::current());
        App::new(QuizGame::new(&SOURCE), voice, None, InputMode::Voice, policy)
    }

    fn current_reading(app: &App<'_>) -> &'static str {
        app.state().current_question().unwrap().entry.canonical_reading()
    }

    /// 非同期タスクを進めながら tick する
    async fn settle(app: &mut App<'_>, now: Instant) {
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            app.tick(now);
        }
    }

    #[tokio::test]
    async fn keyboard_flow_through_a_quiz() {
        let mut app = text_app();
        let now = Instant::now();

        app.handle_key(key(KeyCode::Down), now);
        app.handle_key(key(KeyCode::Enter), now);
        assert_eq!(app.state().grade, Some(GradeScope::Fourth));
        assert_eq!(app.state().phase, Phase::ChoosingCount);

        app.handle_key(key(KeyCode::Enter), now);
        assert_eq!(app.state().phase, Phase::Playing);
        assert_eq!(app.state().total_questions, 10);

        for _ in 0..10 {
            let reading = current_reading(&app);
            type_text(&mut app, reading, now);
            app.handle_key(key(KeyCode::Enter), now);
            assert!(app.state().show_feedback);
            app.handle_key(key(KeyCode::Char(' ')), now);
        }
        assert_eq!(app.state().phase, Phase::Finished);
        assert_eq!(app.state().score, 10);

        app.handle_key(key(KeyCode::Char('r')), now);
        assert_eq!(app.state().phase, Phase::SelectingGrade);
    }

    #[tokio::test]
    async fn reset_is_reachable_before_the_result_screen() {
        let mut app = text_app();
        let now = Instant::now();

        app.handle_key(key(KeyCode::Enter), now);
        assert_eq!(app.state().phase, Phase::ChoosingCount);
        app.handle_key(key(KeyCode::Backspace), now);
        assert_eq!(app.state().phase, Phase::SelectingGrade);
        assert_eq!(app.state().grade, None);

        app.handle_key(key(KeyCode::Char('2')), now);
        app.handle_key(key(KeyCode::Enter), now);
        assert_eq!(app.state().phase, Phase::Playing);
        type_text(&mut app, "ab", now);
        app.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL), now);
        assert_eq!(app.state().phase, Phase::SelectingGrade);
        assert_eq!(app.input(), "");
        assert!(!app.should_quit());

        // 答えの入力中の Backspace は1文字消すだけ
        app.handle_key(key(KeyCode::Enter), now);
        app.handle_key(key(KeyCode::Enter), now);
        type_text(&mut app, "ab", now);
        app.handle_key(key(KeyCode::Backspace), now);
        assert_eq!(app.state().phase, Phase::Playing);
        assert_eq!(app.input(), "a");
    }

    #[tokio::test]
    async fn empty_input_is_not_submitted() {
        let mut app = text_app();
        let now = Instant::now();
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);

        type_text(&mut app, "  ", now);
        app.handle_key(key(KeyCode::Enter), now);
        assert!(!app.state().show_feedback);
        type_text(&mut app, "\u{FEFF}", now);
        app.handle_key(key(KeyCode::Enter), now);
        assert!(!app.state().show_feedback);
        assert!(app.state().questions[0].is_correct.is_none());
    }

    #[tokio::test]
    async fn feedback_dismisses_itself_after_delay() {
        let mut app = text_app();
        let now = Instant::now();
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);
        type_text(&mut app, "まちがい", now);
        app.submit_input(now);

        app.tick(now + Duration::from_millis(1000));
        assert!(app.state().show_feedback);
        assert_eq!(app.state().current_index, 0);

        app.tick(now + FEEDBACK_DELAY);
        assert!(!app.state().show_feedback);
        assert_eq!(app.state().current_index, 1);

        // 次の問題には何も起きない
        app.tick(now + FEEDBACK_DELAY * 3);
        assert_eq!(app.state().current_index, 1);
    }

    #[tokio::test]
    async fn manual_dismiss_cancels_the_timer() {
        let mut app = text_app();
        let now = Instant::now();
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);
        type_text(&mut app, "まちがい", now);
        app.submit_input(now);
        app.handle_key(key(KeyCode::Enter), now);
        assert_eq!(app.state().current_index, 1);

        type_text(&mut app, "まちがい", now);
        app.submit_input(now + Duration::from_millis(1400));
        // 最初のタイマーの期限では閉じない
        app.tick(now + FEEDBACK_DELAY);
        assert!(app.state().show_feedback);
        assert_eq!(app.state().current_index, 1);
    }

    #[tokio::test]
    async fn reset_clears_pending_timers() {
        let mut app = text_app();
        let now = Instant::now();
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);
        type_text(&mut app, "まちがい", now);
        app.submit_input(now);
        app.reset();

        app.tick(now + FEEDBACK_DELAY * 2);
        assert_eq!(app.state(), &GameState::default());
    }

    #[tokio::test]
    async fn unsupported_voice_stays_in_text_mode() {
        let mut app = text_app();
        assert_eq!(app.input_mode(), InputMode::Text);
        app.toggle_input_mode();
        assert_eq!(app.input_mode(), InputMode::Text);
    }

    #[tokio::test]
    async fn voice_transcript_fills_input_for_confirmation() {
        let mut app = voice_app(Speaks(Ok("ひみつ".into())), None, SubmitPolicy::Confirm);
        let now = Instant::now();
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);

        app.handle_key(key(KeyCode::F(2)), now);
        assert!(app.voice().is_listening());
        settle(&mut app, now).await;

        assert_eq!(app.input(), "ひみつ");
        assert!(!app.state().show_feedback);
        app.tick(now + AUTO_SUBMIT_DELAY * 2);
        assert!(!app.state().show_feedback);

        app.handle_key(key(KeyCode::Enter), now);
        assert!(app.state().show_feedback);
        assert_eq!(app.state().questions[0].user_answer, "ひみつ");
    }

    #[tokio::test]
    async fn voice_transcript_auto_submits() {
        let mut app = voice_app(Speaks(Ok("ひみつ".into())), None, SubmitPolicy::AutoSubmit);
        let now = Instant::now();
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);

        app.toggle_listening();
        settle(&mut app, now).await;
        assert!(app.auto_submit_pending());
        assert!(!app.state().show_feedback);

        app.tick(now + AUTO_SUBMIT_DELAY);
        assert!(app.state().show_feedback);
        assert_eq!(app.state().questions[0].is_correct, Some(false));
    }

    #[tokio::test]
    async fn editing_cancels_auto_submit() {
        let mut app = voice_app(Speaks(Ok("ひみ".into())), None, SubmitPolicy::AutoSubmit);
        let now = Instant::now();
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);

        app.toggle_listening();
        settle(&mut app, now).await;
        type_text(&mut app, "つ", now);
        app.tick(now + AUTO_SUBMIT_DELAY * 2);
        assert!(!app.state().show_feedback);
        assert_eq!(app.input(), "ひみつ");
    }

    #[tokio::test]
    async fn recognition_error_becomes_notice() {
        let mut app = voice_app(
            Speaks(Err(RecognitionError::NotAllowed)),
            None,
            SubmitPolicy::Confirm,
        );
        let now = Instant::now();
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);

        app.toggle_listening();
        settle(&mut app, now).await;
        assert_eq!(app.notice(), Some("マイクのアクセス許可が必要です"));
        assert_eq!(app.state().phase, Phase::Playing);
        assert!(!app.state().show_feedback);
    }

    #[tokio::test]
    async fn listening_requires_voice_mode() {
        let mut app = voice_app(Speaks(Ok("やま".into())), None, SubmitPolicy::Confirm);
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);

        app.toggle_input_mode();
        assert_eq!(app.input_mode(), InputMode::Text);
        assert!(!app.toggle_listening());
        assert!(!app.voice().is_listening());
    }

    #[tokio::test]
    async fn stale_conversion_does_not_touch_the_next_question() {
        let (release, gate) = std::sync::mpsc::channel();
        let analyzer: Arc<dyn ReadingAnalyzer> = Arc::new(Gated {
            gate: Mutex::new(gate),
            output: "へんかん".into(),
        });
        let converter = PhoneticConverter::new(move || Ok(Arc::clone(&analyzer)));
        converter.initialize().await.unwrap();

        let mut app = voice_app(Speaks(Ok("漢字".into())), Some(converter), SubmitPolicy::Confirm);
        let now = Instant::now();
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);

        app.toggle_listening();
        settle(&mut app, now).await;
        assert_eq!(app.input(), "漢字");

        // 変換が終わる前に答えて次の問題へ
        app.submit_input(now);
        app.dismiss_feedback();
        assert_eq!(app.state().current_index, 1);

        release.send(()).unwrap();
        settle(&mut app, now).await;

        assert_eq!(app.input(), "");
        assert_eq!(app.state().questions[1].user_answer, "");
        assert_eq!(app.state().questions[0].user_answer, "漢字");
    }

    #[tokio::test]
    async fn conversion_does_not_overwrite_user_edits() {
        let (release, gate) = std::sync::mpsc::channel();
        let analyzer: Arc<dyn ReadingAnalyzer> = Arc::new(Gated {
            gate: Mutex::new(gate),
            output: "かんじ".into(),
        });
        let converter = PhoneticConverter::new(move || Ok(Arc::clone(&analyzer)));
        converter.initialize().await.unwrap();

        let mut app = voice_app(Speaks(Ok("漢字".into())), Some(converter), SubmitPolicy::Confirm);
        let now = Instant::now();
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);

        app.toggle_listening();
        settle(&mut app, now).await;
        app.handle_key(key(KeyCode::Backspace), now);
        type_text(&mut app, "じ", now);

        release.send(()).unwrap();
        settle(&mut app, now).await;
        assert_eq!(app.input(), "漢じ");
    }

    #[tokio::test]
    async fn conversion_replaces_untouched_transcript() {
        let converter = PhoneticConverter::from_builtin();
        converter.initialize().await.unwrap();

        let mut app = voice_app(Speaks(Ok("駅".into())), Some(converter), SubmitPolicy::Confirm);
        let now = Instant::now();
        app.select_grade(GradeScope::Third);
        app.start_quiz(10);

        app.toggle_listening();
        settle(&mut app, now).await;
        assert_eq!(app.input(), "えき");
    }

    #[tokio::test]
    async fn escape_quits() {
        let mut app = text_app();
        app.handle_key(key(KeyCode::Esc), Instant::now());
        assert!(app.should_quit());
    }
}

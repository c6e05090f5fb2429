// ============================================
// src/quiz.rs
// クイズの進行 (出題・答え合わせ・スコア)
// ============================================

use rand::Rng;
use rand::seq::SliceRandom;

use crate::hiragana::normalize;
use crate::questions::{GradeScope, KanjiEntry, KanjiSource};

/// 問題数の選択肢
pub const COUNT_CHOICES: [usize; 2] = [10, 20];

// --------------------------------------------------
// 答え合わせ・出題
// --------------------------------------------------

/// 入力された答えが、読みのどれかと一致するか
pub fn is_correct(entry: &KanjiEntry, answer: &str) -> bool {
    let answer = normalize(answer);
    if answer.is_empty() {
        return false;
    }
    entry.readings.iter().any(|r| normalize(r) == answer)
}

/// プールからランダムに `count` 問えらぶ
pub fn pick_questions<'a>(pool: &[&'a KanjiEntry], count: usize) -> Vec<QuizQuestion<'a>> {
    pick_questions_with(pool, count, &mut rand::rng())
}

/// 乱数生成器を指定して出題する (元のプールは変更しない)
pub fn pick_questions_with<'a, R>(
    pool: &[&'a KanjiEntry],
    count: usize,
    rng: &mut R,
) -> Vec<QuizQuestion<'a>>
where
    R: Rng + ?Sized,
{
    let mut shuffled = pool.to_vec();
    shuffled.shuffle(rng); // Fisher-Yates
    shuffled.truncate(count);
    shuffled.into_iter().map(QuizQuestion::new).collect()
}

// --------------------------------------------------
// データ構造
// --------------------------------------------------

/// 1問分の記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion<'a> {
    pub entry: &'a KanjiEntry,
    pub user_answer: String,
    /// None: まだ答えていない
    pub is_correct: Option<bool>,
}

impl<'a> QuizQuestion<'a> {
    pub fn new(entry: &'a KanjiEntry) -> Self {
        Self {
            entry,
            user_answer: String::new(),
            is_correct: None,
        }
    }
}

/// 画面の段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SelectingGrade,
    ChoosingCount,
    Playing,
    Finished,
}

/// クイズへの操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectGrade(GradeScope),
    StartQuiz(usize),
    SubmitAnswer(String),
    DismissFeedback,
    Reset,
}

/// 1セッション分の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState<'a> {
    pub phase: Phase,
    pub grade: Option<GradeScope>,
    /// 実際に出題される問題数
    pub total_questions: usize,
    /// ユーザーがえらんだ問題数 (プールが足りないと total_questions より大きい)
    pub requested_count: usize,
    pub questions: Vec<QuizQuestion<'a>>,
    pub current_index: usize,
    pub score: usize,
    /// 正解/不正解の表示中 (この間は回答を受け付けない)
    pub show_feedback: bool,
}

impl Default for GameState<'_> {
    fn default() -> Self {
        Self {
            phase: Phase::SelectingGrade,
            grade: None,
            total_questions: 0,
            requested_count: 0,
            questions: Vec::new(),
            current_index: 0,
            score: 0,
            show_feedback: false,
        }
    }
}

impl<'a> GameState<'a> {
    /// 今表示している問題
    pub fn current_question(&self) -> Option<&QuizQuestion<'a>> {
        match self.phase {
            Phase::Playing => self.questions.get(self.current_index),
            _ => None,
        }
    }

    /// 回答を受け付ける状態か
    pub fn accepts_answer(&self) -> bool {
        self.phase == Phase::Playing && !self.show_feedback
    }

    /// 何問目か (1始まり)
    pub fn current_number(&self) -> usize {
        self.current_index + 1
    }

    /// 答えた問題数 (スコア表示の分母)
    pub fn answered_count(&self) -> usize {
        self.current_index + usize::from(self.show_feedback)
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    /// まちがえた問題
    pub fn mistakes(&self) -> impl Iterator<Item = &QuizQuestion<'a>> {
        self.questions
            .iter()
            .filter(|q| q.is_correct == Some(false))
    }

    pub fn result_rank(&self) -> ResultRank {
        ResultRank::from_score(self.score, self.total_questions)
    }
}

// --------------------------------------------------
// 結果
// --------------------------------------------------

/// 正答率による評価
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultRank {
    Perfect,
    Excellent,
    Good,
    Almost,
    KeepTrying,
}

impl ResultRank {
    pub fn from_score(score: usize, total: usize) -> Self {
        if total == 0 {
            return ResultRank::KeepTrying;
        }
        let pct = score as f64 / total as f64;
        if score >= total {
            ResultRank::Perfect
        } else if pct >= 0.8 {
            ResultRank::Excellent
        } else if pct >= 0.6 {
            ResultRank::Good
        } else if pct >= 0.4 {
            ResultRank::Almost
        } else {
            ResultRank::KeepTrying
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ResultRank::Perfect => "パーフェクト！すごい！",
            ResultRank::Excellent => "とてもよくできました！",
            ResultRank::Good => "よくがんばりました！",
            ResultRank::Almost => "もうすこし！",
            ResultRank::KeepTrying => "つぎはもっとできるよ！",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            ResultRank::Perfect => "🏆",
            ResultRank::Excellent => "🎉",
            ResultRank::Good => "😊",
            ResultRank::Almost => "💪",
            ResultRank::KeepTrying => "📚",
        }
    }
}

// --------------------------------------------------
// 状態遷移
// --------------------------------------------------

/// クイズの進行役。状態を持ち、外には読み取り専用で見せる
pub struct QuizGame<'a> {
    source: &'a dyn KanjiSource,
    state: GameState<'a>,
}

impl<'a> QuizGame<'a> {
    pub fn new(source: &'a dyn KanjiSource) -> Self {
        Self {
            source,
            state: GameState::default(),
        }
    }

    pub fn state(&self) -> &GameState<'a> {
        &self.state
    }

    /// 操作を適用する。受け付けられない操作は無視して false を返す
    pub fn dispatch(&mut self, action: Action) -> bool {
        let phase = self.state.phase;
        let applied = match action {
            Action::SelectGrade(grade) => self.apply_select_grade(grade),
            Action::StartQuiz(count) => self.apply_start_quiz(count),
            Action::SubmitAnswer(ref answer) => self.apply_submit_answer(answer),
            Action::DismissFeedback => self.apply_dismiss_feedback(),
            Action::Reset => {
                self.state = GameState::default();
                true
            }
        };
        if !applied {
            tracing::debug!(?action, ?phase, "ignored action");
        }
        applied
    }

    pub fn select_grade(&mut self, grade: GradeScope) -> bool {
        self.dispatch(Action::SelectGrade(grade))
    }

    pub fn start_quiz(&mut self, count: usize) -> bool {
        self.dispatch(Action::StartQuiz(count))
    }

    pub fn submit_answer(&mut self, answer: impl Into<String>) -> bool {
        self.dispatch(Action::SubmitAnswer(answer.into()))
    }

    pub fn dismiss_feedback(&mut self) -> bool {
        self.dispatch(Action::DismissFeedback)
    }

    pub fn reset(&mut self) -> bool {
        self.dispatch(Action::Reset)
    }

    fn apply_select_grade(&mut self, grade: GradeScope) -> bool {
        if self.state.phase != Phase::SelectingGrade {
            return false;
        }
        self.state.grade = Some(grade);
        self.state.phase = Phase::ChoosingCount;
        true
    }

    fn apply_start_quiz(&mut self, count: usize) -> bool {
        let Some(grade) = self.state.grade else {
            return false;
        };
        if self.state.phase != Phase::ChoosingCount {
            return false;
        }

        let source = self.source;
        let pool = source.entries_by_grade(grade);
        let questions = pick_questions(&pool, count);
        if questions.is_empty() {
            tracing::warn!(?grade, count, "no questions available");
            return false;
        }
        if questions.len() < count {
            tracing::warn!(
                ?grade,
                requested = count,
                available = questions.len(),
                "pool smaller than requested count"
            );
        }

        self.state.total_questions = questions.len();
        self.state.requested_count = count;
        self.state.questions = questions;
        self.state.current_index = 0;
        self.state.score = 0;
        self.state.show_feedback = false;
        self.state.phase = Phase::Playing;
        tracing::info!(?grade, total = self.state.total_questions, "quiz started");
        true
    }

    fn apply_submit_answer(&mut self, answer: &str) -> bool {
        if !self.state.accepts_answer() {
            return false;
        }
        let index = self.state.current_index;
        let Some(question) = self.state.questions.get_mut(index) else {
            return false;
        };

        let correct = is_correct(question.entry, answer);
        question.user_answer = answer.to_string();
        question.is_correct = Some(correct);
        if correct {
            self.state.score += 1;
        }
        self.state.show_feedback = true;
        tracing::debug!(index, id = question.entry.id, correct, "answer recorded");
        true
    }

    fn apply_dismiss_feedback(&mut self) -> bool {
        if self.state.phase != Phase::Playing || !self.state.show_feedback {
            return false;
        }
        self.state.show_feedback = false;
        if self.state.is_last_question() {
            self.state.phase = Phase::Finished;
            tracing::info!(
                score = self.state.score,
                total = self.state.total_questions,
                "quiz finished"
            );
        } else {
            self.state.current_index += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::{BuiltinKanji, GRADE3_LIST, Grade};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    const YAMA: KanjiEntry = KanjiEntry {
        id: "t-1",
        kanji: "山",
        readings: &["やま", "さん"],
        meaning: "たかい土地",
        example: "山にのぼる",
        grade: Grade::Third,
    };

    const SMALL_POOL: &[KanjiEntry] = &[
        YAMA,
        KanjiEntry {
            id: "t-2",
            kanji: "川",
            readings: &["かわ", "せん"],
            meaning: "水のながれ",
            example: "川であそぶ",
            grade: Grade::Third,
        },
        KanjiEntry {
            id: "t-3",
            kanji: "森",
            readings: &["もり", "しん"],
            meaning: "木がたくさんあるところ",
            example: "森をあるく",
            grade: Grade::Fourth,
        },
    ];

    struct SmallSource;

    impl KanjiSource for SmallSource {
        fn entries_by_grade(&self, _scope: GradeScope) -> Vec<&KanjiEntry> {
            SMALL_POOL.iter().collect()
        }
    }

    struct EmptySource;

    impl KanjiSource for EmptySource {
        fn entries_by_grade(&self, _scope: GradeScope) -> Vec<&KanjiEntry> {
            Vec::new()
        }
    }

    #[test]
    fn accepts_every_reading_and_its_variants() {
        for entry in crate::questions::all_entries() {
            for reading in entry.readings {
                assert!(is_correct(entry, reading), "{} / {}", entry.kanji, reading);
                let katakana: String = reading
                    .chars()
                    .map(|c| match c {
                        'ぁ'..='ゖ' => char::from_u32(c as u32 + 0x60).unwrap(),
                        _ => c,
                    })
                    .collect();
                assert!(is_correct(entry, &katakana), "{} / {}", entry.kanji, katakana);
                assert!(is_correct(entry, &format!(" {reading}\u{3000}")));
            }
        }
    }

    #[test]
    fn rejects_empty_and_wrong_answers() {
        assert!(!is_correct(&YAMA, ""));
        assert!(!is_correct(&YAMA, "   "));
        assert!(!is_correct(&YAMA, "\u{3000}"));
        assert!(!is_correct(&YAMA, "かわ"));
        assert!(!is_correct(&YAMA, "山"));
    }

    #[test]
    fn matches_any_reading_not_only_the_first() {
        assert!(is_correct(&YAMA, "サン"));
        assert!(is_correct(&YAMA, "や・ま"));
        assert!(is_correct(&YAMA, "\u{FEFF}やま"));
        assert!(!is_correct(&YAMA, "\u{FEFF}"));
    }

    #[test]
    fn picks_exact_count_without_repeats() {
        let pool: Vec<&KanjiEntry> = GRADE3_LIST.iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        let questions = pick_questions_with(&pool, 10, &mut rng);

        assert_eq!(questions.len(), 10);
        let ids: HashSet<_> = questions.iter().map(|q| q.entry.id).collect();
        assert_eq!(ids.len(), 10);
        assert!(questions.iter().all(|q| pool.iter().any(|e| e.id == q.entry.id)));
        assert!(
            questions
                .iter()
                .all(|q| q.user_answer.is_empty() && q.is_correct.is_none())
        );
    }

    #[test]
    fn picks_whole_pool_when_count_is_larger() {
        let pool: Vec<&KanjiEntry> = SMALL_POOL.iter().collect();
        let questions = pick_questions(&pool, 10);
        assert_eq!(questions.len(), 3);
        let ids: HashSet<_> = questions.iter().map(|q| q.entry.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn picking_does_not_touch_the_pool() {
        let pool: Vec<&KanjiEntry> = SMALL_POOL.iter().collect();
        let before: Vec<_> = pool.iter().map(|e| e.id).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let _ = pick_questions_with(&pool, 2, &mut rng);
        let after: Vec<_> = pool.iter().map(|e| e.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn duplicated_pool_entries_may_repeat() {
        let pool = vec![&YAMA, &YAMA];
        let questions = pick_questions(&pool, 5);
        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.entry.id == "t-1"));
    }

    #[test]
    fn shuffle_reaches_every_first_position() {
        let pool: Vec<&KanjiEntry> = SMALL_POOL.iter().collect();
        let mut rng = StdRng::seed_from_u64(42);
        let mut firsts = HashSet::new();
        for _ in 0..200 {
            let questions = pick_questions_with(&pool, 1, &mut rng);
            firsts.insert(questions[0].entry.id);
        }
        assert_eq!(firsts.len(), 3);
    }

    #[test]
    fn full_session_scenario() {
        let source = BuiltinKanji;
        let mut game = QuizGame::new(&source);
        assert_eq!(game.state().phase, Phase::SelectingGrade);

        assert!(game.select_grade(GradeScope::Third));
        assert_eq!(game.state().phase, Phase::ChoosingCount);
        assert_eq!(game.state().grade, Some(GradeScope::Third));

        assert!(game.start_quiz(10));
        let state = game.state();
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.questions.len(), 10);
        assert_eq!(state.total_questions, 10);
        assert_eq!(state.current_index, 0);
        assert_eq!(state.score, 0);
        assert!(state.questions.iter().all(|q| q.entry.grade == Grade::Third));

        let first = game.state().questions[0].entry.canonical_reading();
        assert!(game.submit_answer(first));
        assert_eq!(game.state().questions[0].is_correct, Some(true));
        assert_eq!(game.state().questions[0].user_answer, first);
        assert_eq!(game.state().score, 1);
        assert!(game.state().show_feedback);
        assert_eq!(game.state().answered_count(), 1);

        assert!(game.dismiss_feedback());
        assert_eq!(game.state().current_index, 1);
        assert!(!game.state().show_feedback);

        // 奇数番目はわざとまちがえる
        for i in 1..10 {
            let answer = if i % 2 == 0 {
                game.state().questions[i].entry.canonical_reading().to_string()
            } else {
                "まちがい".to_string()
            };
            assert!(game.submit_answer(answer));
            assert!(game.dismiss_feedback());
        }

        let state = game.state();
        assert_eq!(state.phase, Phase::Finished);
        assert!(!state.show_feedback);
        assert_eq!(state.score, 5);
        assert_eq!(state.mistakes().count(), 5);
        assert_eq!(state.result_rank(), ResultRank::Almost);
        assert!(state.questions.iter().all(|q| q.is_correct.is_some()));
    }

    #[test]
    fn submit_while_feedback_is_shown_is_ignored() {
        let source = SmallSource;
        let mut game = QuizGame::new(&source);
        game.select_grade(GradeScope::Both);
        game.start_quiz(3);
        game.submit_answer("まちがい");

        let before = game.state().clone();
        assert!(!game.submit_answer(before.questions[0].entry.canonical_reading()));
        assert_eq!(game.state(), &before);
    }

    #[test]
    fn invalid_actions_leave_state_unchanged() {
        let source = SmallSource;
        let mut game = QuizGame::new(&source);

        let initial = game.state().clone();
        assert!(!game.submit_answer("やま"));
        assert!(!game.dismiss_feedback());
        assert!(!game.start_quiz(10));
        assert_eq!(game.state(), &initial);

        game.select_grade(GradeScope::Fourth);
        let choosing = game.state().clone();
        assert!(!game.select_grade(GradeScope::Third));
        assert!(!game.submit_answer("やま"));
        assert_eq!(game.state(), &choosing);

        game.start_quiz(3);
        let playing = game.state().clone();
        assert!(!game.dismiss_feedback());
        assert!(!game.start_quiz(3));
        assert!(!game.select_grade(GradeScope::Third));
        assert_eq!(game.state(), &playing);
    }

    #[test]
    fn reset_from_finished_returns_to_grade_selection() {
        let source = SmallSource;
        let mut game = QuizGame::new(&source);
        game.select_grade(GradeScope::Third);
        game.start_quiz(1);
        let answer = game.state().questions[0].entry.canonical_reading();
        game.submit_answer(answer);
        game.dismiss_feedback();
        assert_eq!(game.state().phase, Phase::Finished);
        assert_eq!(game.state().score, 1);

        assert!(game.reset());
        assert_eq!(game.state(), &GameState::default());
        assert_eq!(game.state().grade, None);
        assert_eq!(game.state().score, 0);
    }

    #[test]
    fn reset_is_valid_mid_quiz() {
        let source = SmallSource;
        let mut game = QuizGame::new(&source);
        game.select_grade(GradeScope::Third);
        game.start_quiz(3);
        game.submit_answer("やま");
        assert!(game.reset());
        assert_eq!(game.state().phase, Phase::SelectingGrade);
    }

    #[test]
    fn small_pool_uses_delivered_count() {
        let source = SmallSource;
        let mut game = QuizGame::new(&source);
        game.select_grade(GradeScope::Both);
        game.start_quiz(10);

        assert_eq!(game.state().requested_count, 10);
        assert_eq!(game.state().total_questions, 3);
        for _ in 0..3 {
            game.submit_answer("まちがい");
            game.dismiss_feedback();
        }
        assert_eq!(game.state().phase, Phase::Finished);
        assert_eq!(game.state().current_index, 2);
    }

    #[test]
    fn empty_pool_does_not_start() {
        let source = EmptySource;
        let mut game = QuizGame::new(&source);
        game.select_grade(GradeScope::Third);
        assert!(!game.start_quiz(10));
        assert_eq!(game.state().phase, Phase::ChoosingCount);
    }

    #[test]
    fn result_rank_thresholds() {
        assert_eq!(ResultRank::from_score(10, 10), ResultRank::Perfect);
        assert_eq!(ResultRank::from_score(8, 10), ResultRank::Excellent);
        assert_eq!(ResultRank::from_score(6, 10), ResultRank::Good);
        assert_eq!(ResultRank::from_score(4, 10), ResultRank::Almost);
        assert_eq!(ResultRank::from_score(3, 10), ResultRank::KeepTrying);
        assert_eq!(ResultRank::from_score(0, 0), ResultRank::KeepTrying);
    }
}

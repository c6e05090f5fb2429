// ============================================
// src/plain.rs
// 端末がないとき用の行ごとのクイズ (キーボード入力のみ)
// ============================================

use anyhow::Result;
use console::{Style, Term};
use dialoguer::{Confirm, Input, Select};

use crate::questions::GradeScope;
use crate::quiz::{COUNT_CHOICES, Phase, QuizGame};

/// 学年ともんだい数を選んで、最後まで1行ずつ出題する
pub fn run(game: &mut QuizGame, mut preset: Option<(GradeScope, usize)>) -> Result<()> {
    let term = Term::stdout();
    let title = Style::new().yellow().bold();
    term.write_line(&title.apply_to("漢字クイズ").to_string())?;
    term.write_line("よみがなをひらがなで入力しよう！")?;

    loop {
        let (grade, count) = match preset.take() {
            Some(choice) => choice,
            None => ask_setup()?,
        };
        game.select_grade(grade);
        if !game.start_quiz(count) {
            term.write_line("出題できる漢字がありません")?;
            return Ok(());
        }

        play_round(&term, game)?;
        print_summary(&term, game)?;

        let again = Confirm::new()
            .with_prompt("もういちど？")
            .default(true)
            .interact()?;
        game.reset();
        if !again {
            return Ok(());
        }
    }
}

fn ask_setup() -> Result<(GradeScope, usize)> {
    let grades: Vec<&str> = GradeScope::ALL.iter().map(|g| g.label()).collect();
    let grade = Select::new()
        .with_prompt("学年をえらんでね")
        .items(&grades)
        .default(0)
        .interact()?;

    let counts: Vec<String> = COUNT_CHOICES.iter().map(|c| format!("{c}もん")).collect();
    let count = Select::new()
        .with_prompt("もんだいの数をえらんでね")
        .items(&counts)
        .default(0)
        .interact()?;

    Ok((GradeScope::ALL[grade], COUNT_CHOICES[count]))
}

fn play_round(term: &Term, game: &mut QuizGame) -> Result<()> {
    let dim = Style::new().dim();
    let good = Style::new().green().bold();
    let bad = Style::new().red().bold();

    while game.state().phase == Phase::Playing {
        let state = game.state();
        let Some(question) = state.current_question() else {
            break;
        };
        let entry = question.entry;

        term.write_line("")?;
        term.write_line(&format!(
            "{} / {} もん   {} / {} せいかい",
            state.current_number(),
            state.total_questions,
            state.score,
            state.answered_count()
        ))?;
        term.write_line(&Style::new().bold().apply_to(entry.kanji).to_string())?;
        term.write_line(&format!("💡 {}", entry.meaning))?;
        term.write_line(&dim.apply_to(format!("📖 {}", entry.example)).to_string())?;

        // 空の答えは受け付けない
        let answer: String = Input::new()
            .with_prompt("こたえ")
            .validate_with(|s: &String| {
                if s.trim().is_empty() {
                    Err("ひらがなで入力してね")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        game.submit_answer(answer.trim());

        if let Some(answered) = game.state().current_question() {
            if answered.is_correct == Some(true) {
                term.write_line(&good.apply_to("⭕ せいかい！").to_string())?;
            } else {
                term.write_line(&bad.apply_to("❌ ざんねん…").to_string())?;
                term.write_line(&format!(
                    "あなたの答え：{}  こたえ：{}",
                    answered.user_answer,
                    answered.entry.canonical_reading()
                ))?;
            }
        }
        game.dismiss_feedback();
    }
    Ok(())
}

fn print_summary(term: &Term, game: &QuizGame) -> Result<()> {
    let state = game.state();
    let rank = state.result_rank();
    term.write_line("")?;
    term.write_line(&format!(
        "{} {}",
        rank.emoji(),
        Style::new()
            .yellow()
            .bold()
            .apply_to(format!("{} / {} せいかい", state.score, state.total_questions))
    ))?;
    term.write_line(rank.message())?;

    let mut mistakes = state.mistakes().peekable();
    if mistakes.peek().is_some() {
        term.write_line(&Style::new().red().apply_to("まちがえたもんだい").to_string())?;
        for q in mistakes {
            term.write_line(&format!(
                "  {}  あなた：{}  こたえ：{}",
                q.entry.kanji,
                q.user_answer,
                q.entry.canonical_reading()
            ))?;
        }
    }
    Ok(())
}

// ============================================
// src/ui.rs
// UI描画
// ============================================

use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph},
};

use crate::app::App;
use crate::questions::GradeScope;
use crate::quiz::{COUNT_CHOICES, GameState, Phase};
use crate::save_data::InputMode;

const ACCENT: Color = Color::Yellow;

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();
    // 枠線を描画
    let block = Block::default().borders(Borders::ALL).title("漢字クイズ");
    let inner_area = block.inner(size);
    f.render_widget(block, size);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // [0] 説明
            Constraint::Length(1), // [1] 空白
            Constraint::Min(1),    // [2] 本体
            Constraint::Length(1), // [3] 操作説明
        ])
        .split(inner_area);

    f.render_widget(
        Paragraph::new("よみがなをひらがなで入力しよう！")
            .style(Style::default().fg(ACCENT))
            .centered(),
        chunks[0],
    );

    let state = app.state();
    let help = match state.phase {
        Phase::SelectingGrade => {
            draw_grade_select(f, app, chunks[2]);
            "↑↓ / 1-3: えらぶ  Enter: けってい  Esc: おわる"
        }
        Phase::ChoosingCount => {
            draw_count_select(f, app, chunks[2]);
            "←→: えらぶ  Enter: スタート  Backspace: もどる  Esc: おわる"
        }
        Phase::Playing => {
            draw_playing(f, app, chunks[2]);
            if state.show_feedback {
                draw_feedback(f, state, size);
                "Enter / Space: つぎへ"
            } else if app.voice().is_supported() {
                "Enter: こたえる  Tab: 入力きりかえ  F2: 録音  Ctrl+R: さいしょから  Esc: おわる"
            } else {
                "Enter: こたえる  Ctrl+R: さいしょから  Esc: おわる"
            }
        }
        Phase::Finished => {
            draw_result(f, state, chunks[2]);
            "Enter / r: もういちど  Esc: おわる"
        }
    };

    f.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(Color::DarkGray))
            .centered(),
        chunks[3],
    );
}

/// 選択肢の1行 (選択中はハイライト)
fn choice_line(label: String, selected: bool) -> Line<'static> {
    if selected {
        Line::from(Span::styled(
            format!("▶ {label}"),
            Style::default().fg(Color::Black).bg(ACCENT).bold(),
        ))
    } else {
        Line::from(Span::styled(
            format!("  {label}"),
            Style::default().fg(Color::White),
        ))
    }
}

fn draw_grade_select(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from("学年をえらんでね").bold(),
        Line::from(""),
    ];
    for (i, grade) in GradeScope::ALL.iter().enumerate() {
        lines.push(choice_line(
            format!("{}. {}", i + 1, grade.label()),
            i == app.grade_cursor(),
        ));
    }
    f.render_widget(Paragraph::new(lines).centered(), area);
}

fn draw_count_select(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    for (i, count) in COUNT_CHOICES.iter().enumerate() {
        let label = format!(" {count}もん ");
        let style = if i == app.count_cursor() {
            Style::default().fg(Color::Black).bg(ACCENT).bold()
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw("   "));
    }

    let grade = app.state().grade.map(|g| g.label()).unwrap_or_default();
    let lines = vec![
        Line::from(grade).style(Style::default().fg(Color::Gray)),
        Line::from("もんだいの数をえらんでね").bold(),
        Line::from(""),
        Line::from(spans),
    ];
    f.render_widget(Paragraph::new(lines).centered(), area);
}

fn draw_playing(f: &mut Frame, app: &App, area: Rect) {
    let state = app.state();
    let Some(question) = state.current_question() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // [0] 進み具合
            Constraint::Length(1), // [1] スコア
            Constraint::Length(1), // [2] 空白
            Constraint::Length(1), // [3] 漢字
            Constraint::Length(1), // [4] 意味
            Constraint::Length(1), // [5] 例文
            Constraint::Length(1), // [6] 空白
            Constraint::Length(3), // [7] 入力欄
            Constraint::Length(1), // [8] 入力方法
            Constraint::Min(1),    // [9] お知らせ
        ])
        .split(area);

    // 0. 進み具合のゲージ
    let total = state.total_questions;
    let ratio = if total > 0 {
        (state.current_number() as f64 / total as f64).min(1.0)
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::NONE))
        .gauge_style(Style::default().fg(ACCENT).bg(Color::Black))
        .ratio(ratio)
        .label(format!("{} / {} もん", state.current_number(), total));
    f.render_widget(gauge, chunks[0]);

    // 1. スコア
    f.render_widget(
        Paragraph::new(format!("{} / {} せいかい", state.score, state.answered_count()))
            .style(Style::default().fg(ACCENT).bold())
            .right_aligned(),
        chunks[1],
    );

    // 3-5. 漢字・意味・例文
    f.render_widget(
        Paragraph::new(question.entry.kanji)
            .style(Style::default().fg(Color::White).bold())
            .centered(),
        chunks[3],
    );
    f.render_widget(
        Paragraph::new(format!("💡 {}", question.entry.meaning))
            .style(Style::default().fg(ACCENT))
            .centered(),
        chunks[4],
    );
    f.render_widget(
        Paragraph::new(format!("📖 {}", question.entry.example))
            .style(Style::default().fg(Color::Gray))
            .centered(),
        chunks[5],
    );

    // 7. 入力欄
    let input_line = if app.input().is_empty() && !state.show_feedback {
        Line::from(Span::styled(
            "ひらがなで入力",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(vec![
            Span::raw(app.input().to_string()),
            Span::styled(" ", Style::default().bg(Color::White)),
        ])
    };
    let border = if state.show_feedback {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(ACCENT)
    };
    f.render_widget(
        Paragraph::new(input_line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title("こたえ"),
        ),
        chunks[7],
    );

    // 8. 入力方法
    let mode_line = match app.input_mode() {
        InputMode::Text => Line::from(format!("入力: {}", InputMode::Text.label())),
        InputMode::Voice if app.voice().is_listening() => Line::from(Span::styled(
            "🎤 きいています… (F2 で停止)",
            Style::default().fg(Color::Red).bold(),
        )),
        InputMode::Voice if app.auto_submit_pending() => {
            Line::from("🎤 まもなく送信します (書きかえると取り消し)")
        }
        InputMode::Voice if !app.voice().transcript().is_empty() => Line::from(format!(
            "🎤 「{}」 (F2 でもう一度)",
            app.voice().transcript()
        )),
        InputMode::Voice => Line::from("🎤 F2 で話す → Enter でこたえる"),
    };
    f.render_widget(
        Paragraph::new(mode_line)
            .style(Style::default().fg(Color::Gray))
            .centered(),
        chunks[8],
    );

    // 9. お知らせ (音声認識エラーなど)
    if let Some(notice) = app.notice() {
        f.render_widget(
            Paragraph::new(notice)
                .style(Style::default().fg(Color::Red))
                .centered(),
            chunks[9],
        );
    }
}

/// 正解/不正解のポップアップ
fn draw_feedback(f: &mut Frame, state: &GameState, area: Rect) {
    let Some(question) = state.current_question() else {
        return;
    };
    let correct = question.is_correct == Some(true);
    let (mark, title, color) = if correct {
        ("⭕", "せいかい！", Color::Green)
    } else {
        ("❌", "ざんねん…", Color::Red)
    };

    let mut lines = vec![
        Line::from(mark),
        Line::from(title).style(Style::default().fg(color).bold()),
    ];
    if !correct {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("あなたの答え：", Style::default().fg(Color::Gray)),
            Span::styled(question.user_answer.clone(), Style::default().fg(Color::Red).bold()),
        ]));
        lines.push(Line::from(vec![
            Span::raw("こたえ："),
            Span::styled(
                question.entry.canonical_reading(),
                Style::default().fg(Color::Green).bold(),
            ),
        ]));
    }

    let height = lines.len() as u16 + 2;
    let popup = centered_rect(40, height, area);
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).centered().block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        ),
        popup,
    );
}

fn draw_result(f: &mut Frame, state: &GameState, area: Rect) {
    let rank = state.result_rank();
    let mut lines = vec![
        Line::from(rank.emoji()),
        Line::from(format!("{} / {} せいかい", state.score, state.total_questions))
            .style(Style::default().fg(ACCENT).bold()),
        Line::from(rank.message()),
    ];
    if state.requested_count > state.total_questions {
        lines.push(
            Line::from(format!(
                "(漢字が足りないので {}もん にしました)",
                state.total_questions
            ))
            .style(Style::default().fg(Color::DarkGray)),
        );
    }

    let mistakes: Vec<_> = state.mistakes().collect();
    if !mistakes.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from("まちがえたもんだい").style(Style::default().fg(Color::Red).bold()));
        for q in mistakes {
            lines.push(Line::from(vec![
                Span::styled(format!("{}  ", q.entry.kanji), Style::default().bold()),
                Span::styled(
                    format!("あなた：{}  ", q.user_answer),
                    Style::default().fg(Color::Red),
                ),
                Span::styled(
                    format!("こたえ：{}", q.entry.canonical_reading()),
                    Style::default().fg(Color::Green),
                ),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines).centered(), area);
}

/// 画面の中央に置く領域
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

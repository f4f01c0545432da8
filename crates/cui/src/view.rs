use crate::app::{App, GRID_COLUMNS};
use lixi_core::CardKind;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Alignment, Color, Line, Modifier, Style, Stylize};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

pub fn draw(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(12),
            Constraint::Length(6),
        ])
        .split(frame.area());

    draw_header(frame, root[0], app);
    draw_grid(frame, root[1], app);
    draw_result(frame, root[2], app);

    if app.eligibility.is_blocked() {
        draw_blocker(frame);
    }
    if app.name_input.is_some() {
        draw_name_prompt(frame, app);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let phase = app
        .sequencer
        .as_ref()
        .map(|seq| format!("{:?}", seq.phase()))
        .unwrap_or_else(|| "Blocked".to_string());
    let sparkle = match app.effects.last_pitch {
        Some(pitch) if pitch >= 1.2 => "✨✨✨",
        Some(pitch) if pitch >= 0.95 => "✨✨",
        Some(_) => "✨",
        None => "",
    };
    let lines = vec![
        Line::from("🧧 Lì Xì Tết 2026 🧧".bold()),
        Line::from(format!("{}  {}", app.status_line, sparkle)),
        Line::from(format!(
            "Device {} | Phase {} | Seed {}",
            app.device, phase, app.seed
        )),
    ];
    let block = Block::default().borders(Borders::ALL).title("Lucky money");
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn draw_grid(frame: &mut Frame, area: Rect, app: &App) {
    let total = app.total_cards();
    let rows = total.div_ceil(GRID_COLUMNS);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(area);
    for (row, row_area) in row_areas.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
            .split(*row_area);
        for (col, cell) in cells.iter().enumerate() {
            let index = row * GRID_COLUMNS + col;
            if index < total {
                draw_card(frame, *cell, app, index);
            }
        }
    }
}

fn draw_card(frame: &mut Frame, area: Rect, app: &App, index: usize) {
    let is_user = app.user_slot() == Some(index);
    let focused = app.cursor == index;
    let mut title = format!("#{}", index + 1);
    if is_user {
        title.push_str(" 👆 CHỌN ĐI");
    }
    let mut border = Style::default().fg(Color::Red);
    if focused {
        border = border.fg(Color::Yellow).add_modifier(Modifier::BOLD);
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border);

    let face = app
        .sequencer
        .as_ref()
        .filter(|_| app.board.is_flipped(index))
        .map(|seq| seq.prizes().face(index));
    let lines = match face {
        Some(face) => {
            let style = match face.kind {
                CardKind::User => Style::default().fg(Color::Yellow).bold(),
                CardKind::Top => Style::default().fg(Color::LightYellow).bold(),
                CardKind::Lesser => Style::default().fg(Color::White),
            };
            let icon = if face.kind == CardKind::Top { "💰" } else { "🧧" };
            vec![
                Line::from(icon),
                Line::styled(face.label, style),
                Line::from(face.tag),
            ]
        }
        None => vec![Line::from(""), Line::from("福".red().bold()), Line::from("春")],
    };
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

fn draw_result(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();
    if let Some(result) = app.board.result.as_ref() {
        lines.push(Line::from(format!("🎊 {}", result.amount_label).bold()));
        if !result.missed_positions.is_empty() {
            let positions: Vec<String> = result
                .missed_positions
                .iter()
                .map(|pos| pos.to_string())
                .collect();
            lines.push(Line::from(format!(
                "😅 Tiếc quá! Bao {} nằm ở vị trí: {}",
                result.top_prize_label,
                positions.join(", ")
            )));
        }
    }
    if let Some(bursts) = app.effects.celebration_bursts() {
        lines.push(Line::from("🎆 🎇 ✨ ".repeat(bursts).yellow()));
    }
    let block = Block::default().borders(Borders::ALL).title("Kết quả");
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block),
        area,
    );
}

fn draw_blocker(frame: &mut Frame) {
    let area = centered_rect(60, 20, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(
        Paragraph::new(vec![
            Line::from("🧧 Thiết bị này đã nhận lì xì rồi!".bold()),
            Line::from("q = quit"),
        ])
        .alignment(Alignment::Center)
        .block(block),
        area,
    );
}

fn draw_name_prompt(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 24, frame.area());
    frame.render_widget(Clear, area);
    let input = app.name_input.as_deref().unwrap_or_default();
    let lines = vec![
        Line::from("Nhập tên của bạn để lưu kết quả 🧧"),
        Line::from("Enter=confirm  Esc=skip"),
        Line::from(""),
        Line::from(format!("> {input}")),
    ];
    let block = Block::default()
        .title("Tên")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

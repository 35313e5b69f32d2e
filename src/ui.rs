//! TUI rendering module.
//!
//! This module handles all visual rendering using ratatui:
//! - Query form with the fields of the active mode
//! - Results panel fed by [`result_view::ResultView`]
//! - Status bar with mode, focus and request info
//! - Error popup and help overlay

pub mod glyphs;
pub mod result_view;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::model::{AppState, Field, QueryForm, QueryMode, AMINO_ACIDS};
use crate::patterns::{self, EditError};
use result_view::ResultView;

/// Width of the field labels in the form.
const LABEL_WIDTH: usize = 11;
/// Height of the status bar.
const STATUS_BAR_HEIGHT: u16 = 1;
/// Amino acids per row in the selector.
const AA_PER_ROW: usize = 10;

const HELP_TEXT: &[&str] = &[
    "Tab / Down      next field",
    "Shift+Tab / Up  previous field",
    "Left / Right    change mode or organism, move in selector",
    "Space           toggle amino acid under cursor",
    "A..Y            toggle amino acid (selector)",
    "h / l           change mode or organism",
    "Enter           submit now",
    "Backspace       delete character",
    "F1              show this help",
    "?               show this help (mode, organism, selector)",
    "q               quit (mode, organism)",
    "Esc / Ctrl+C    quit",
    "",
    "Queries are sent automatically shortly after each change.",
];

/// Renders the complete UI.
pub fn render(frame: &mut Frame, state: &AppState) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(form_height(state.form().mode)),
            Constraint::Min(3),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);

    render_form(frame, state, main_layout[0]);
    render_results(frame, state, main_layout[1]);
    render_status_bar(frame, state, main_layout[2]);

    if let Some(message) = state.error_message() {
        render_error_popup(frame, message, area);
    }
    if state.show_help {
        render_help(frame, area);
    }
}

/// Height of the form panel, including borders.
pub fn form_height(mode: QueryMode) -> u16 {
    let rows = match mode {
        QueryMode::AaSeq => 5,
        QueryMode::AminoAcids => 2 + AMINO_ACIDS.len().div_ceil(AA_PER_ROW) + 1,
        QueryMode::Codon => 3,
    };
    rows as u16 + 2
}

fn label(text: &str, focused: bool) -> Span<'static> {
    let style = if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Span::styled(format!("{text:<LABEL_WIDTH$}"), style)
}

fn text_line(state: &AppState, field: Field, name: &str, value: &str, valid: bool) -> Line<'static> {
    let focused = state.focus == field;
    let style = if value.is_empty() || valid {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::Red)
    };
    let mut spans = vec![label(name, focused), Span::styled(value.to_string(), style)];
    if focused {
        spans.push(Span::styled(
            state.glyphs.cursor,
            Style::default().add_modifier(Modifier::SLOW_BLINK),
        ));
    }
    Line::from(spans)
}

fn mode_line(state: &AppState) -> Line<'static> {
    let focused = state.focus == Field::Mode;
    let mut spans = vec![label("Mode", focused)];
    if focused {
        spans.push(Span::raw(format!("{} ", state.glyphs.arrow_left)));
    }
    for (i, mode) in QueryMode::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" | "));
        }
        let style = if *mode == state.form().mode {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(mode.to_string(), style));
    }
    if focused {
        spans.push(Span::raw(format!(" {}", state.glyphs.arrow_right)));
    }
    Line::from(spans)
}

fn organism_line(state: &AppState) -> Line<'static> {
    let focused = state.focus == Field::Organism;
    let value = match &state.form().organism {
        Some(organism) => Span::styled(
            format!("{} ({})", organism.name, organism.id),
            Style::default().fg(Color::White),
        ),
        None => Span::styled("(none)", Style::default().fg(Color::Yellow)),
    };
    let mut spans = vec![label("Organism", focused)];
    if focused {
        spans.push(Span::raw(format!("{} ", state.glyphs.arrow_left)));
    }
    spans.push(value);
    if focused {
        spans.push(Span::raw(format!(" {}", state.glyphs.arrow_right)));
    }
    Line::from(spans)
}

/// Describes problems in the edit list, if any.
///
/// Uses the backend grammar, so `K12RH` and `K12-P` are accepted.
fn edits_note(aa_seq: &str, edits: &str) -> Option<String> {
    patterns::parse_edits(edits, aa_seq).err().map(|e| match e {
        EditError::Syntax(_) => format!("{e} (expected e.g. A12G,K31RH,V3-P)"),
        EditError::Mismatch(_) => e.to_string(),
    })
}

/// Placeholder for the results panel when there is no result set.
fn empty_results_hint(form: &QueryForm) -> &'static str {
    if form.organism.is_none() {
        "Select an organism to search."
    } else if form.query().is_none() {
        "Fill in the query to search."
    } else {
        "No results."
    }
}

fn amino_acid_lines(state: &AppState) -> Vec<Line<'static>> {
    let focused = state.focus == Field::AminoAcids;
    let selected = &state.form().amino_acids;
    let mut lines = Vec::new();

    for (row, chunk) in AMINO_ACIDS.chunks(AA_PER_ROW).enumerate() {
        let mut spans = vec![label(if row == 0 { "Amino acids" } else { "" }, focused && row == 0)];
        for (col, &aa) in chunk.iter().enumerate() {
            let index = row * AA_PER_ROW + col;
            let is_selected = selected.contains(&aa);
            let glyph = if is_selected {
                state.glyphs.selected
            } else {
                state.glyphs.unselected
            };
            let mut style = if is_selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            if focused && index == state.aa_cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(format!("{glyph}{aa}"), style));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    let order: String = selected.iter().collect();
    lines.push(Line::from(vec![
        label("Selected", false),
        Span::styled(order, Style::default().fg(Color::White)),
    ]));
    lines
}

/// Renders the query form.
fn render_form(frame: &mut Frame, state: &AppState, area: Rect) {
    let form = state.form();
    let mut lines = vec![mode_line(state), organism_line(state)];

    match form.mode {
        QueryMode::AaSeq => {
            lines.push(text_line(
                state,
                Field::AaSeq,
                "Sequence",
                &form.aa_seq,
                patterns::is_aa_seq(&form.aa_seq),
            ));
            let note = edits_note(&form.aa_seq, &form.edits);
            lines.push(text_line(state, Field::Edits, "Edits", &form.edits, note.is_none()));
            if let Some(note) = note {
                lines.push(Line::from(vec![
                    label("", false),
                    Span::styled(note, Style::default().fg(Color::Red)),
                ]));
            }
        }
        QueryMode::AminoAcids => lines.extend(amino_acid_lines(state)),
        QueryMode::Codon => {
            lines.push(text_line(
                state,
                Field::Codon,
                "Codon",
                &form.codon,
                patterns::is_codon(&form.codon),
            ));
        }
    }

    let block = Block::default().borders(Borders::ALL).title("Query");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders the results panel.
fn render_results(frame: &mut Frame, state: &AppState, area: Rect) {
    let controller = &state.controller;
    let view = ResultView::new(controller.results(), state.form().mode);
    let width = (area.width.saturating_sub(2) as usize).max(1);

    let lines: Vec<Line> = if controller.is_busy() {
        vec![Line::from(Span::styled(
            format!("{} Calculating", state.glyphs.busy),
            Style::default().fg(Color::Yellow),
        ))]
    } else if !view.has_results() {
        let hint = empty_results_hint(state.form());
        vec![Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray)))]
    } else {
        view.lines()
            .iter()
            .flat_map(|line| {
                if line.is_empty() {
                    vec![String::new()]
                } else {
                    textwrap::wrap(line, width)
                        .into_iter()
                        .map(|l| l.into_owned())
                        .collect()
                }
            })
            .map(Line::from)
            .collect()
    };

    let title = match controller.results() {
        Some(results) => format!("Results ({})", results.len()),
        None => "Results".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders the status bar at the bottom.
fn render_status_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let controller = &state.controller;
    let activity = if controller.is_busy() {
        "BUSY"
    } else if controller.has_pending_submit() {
        "EDITING"
    } else {
        "READY"
    };

    let left_content = format!(" {} | {} | F1 help ", activity, state.form().mode);
    let right_content = format!(
        "query #{} | {} sent ",
        controller.generation(),
        controller.requests_sent()
    );

    let left_len = left_content.len();
    let status_line = Line::from(vec![
        Span::styled(left_content, Style::default().fg(Color::Black).bg(Color::Cyan)),
        Span::styled(
            " ".repeat((area.width as usize).saturating_sub(left_len + right_content.len())),
            Style::default().bg(Color::Cyan),
        ),
        Span::styled(
            right_content,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    frame.render_widget(Paragraph::new(status_line), area);
}

fn render_error_popup(frame: &mut Frame, message: &str, area: Rect) {
    let popup = centered_rect(60, 5, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Error")
        .border_style(Style::default().fg(Color::Red));
    let paragraph = Paragraph::new(vec![
        Line::from(message.to_string()),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(block)
    .wrap(Wrap { trim: true });
    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(70, HELP_TEXT.len() as u16 + 2, area);
    let lines: Vec<Line> = HELP_TEXT.iter().map(|l| Line::from(*l)).collect();
    let block = Block::default().borders(Borders::ALL).title("Help");
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// Returns a rectangle centered in `area`, `percent_x` wide and `height` tall.
pub fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_height() {
        assert_eq!(form_height(QueryMode::Codon), 5);
        assert_eq!(form_height(QueryMode::AaSeq), 7);
        assert_eq!(form_height(QueryMode::AminoAcids), 7);
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let rect = centered_rect(60, 5, area);
        assert_eq!(rect, Rect::new(20, 22, 60, 5));

        let small = centered_rect(60, 10, Rect::new(0, 0, 10, 4));
        assert_eq!(small.height, 4);

        let wide = centered_rect(70, 10, Rect::new(0, 0, 1000, 40));
        assert_eq!(wide, Rect::new(150, 15, 700, 10));
    }

    #[test]
    fn test_edits_note() {
        assert_eq!(edits_note("MKV", ""), None);
        assert_eq!(edits_note("MKV", "M1A"), None);
        assert!(edits_note("MKV", "M1").is_some());
        assert_eq!(edits_note("MKV", "K1A"), Some("Edit 'K1A' is invalid".to_string()));
    }

    #[test]
    fn test_edits_note_accepts_backend_grammar() {
        assert_eq!(edits_note("MKV", "K2RH"), None);
        assert_eq!(edits_note("MKV", "V3-P"), None);
        assert_eq!(edits_note("MKV", "M1A,K2RH,V3-P"), None);
        assert_eq!(edits_note("MKV", "V2-P"), Some("Edit 'V2-P' is invalid".to_string()));
    }

    #[test]
    fn test_empty_results_hint() {
        let form = QueryForm {
            mode: QueryMode::Codon,
            codon: "NNK".to_string(),
            ..QueryForm::default()
        };
        assert_eq!(empty_results_hint(&form), "No results.");

        let incomplete = QueryForm {
            codon: "NN".to_string(),
            ..form.clone()
        };
        assert_eq!(empty_results_hint(&incomplete), "Fill in the query to search.");

        let no_organism = QueryForm {
            organism: None,
            ..form
        };
        assert_eq!(empty_results_hint(&no_organism), "Select an organism to search.");
    }

    #[test]
    fn test_help_lists_help_keys() {
        assert!(HELP_TEXT.iter().any(|l| l.starts_with("F1")));
        assert!(HELP_TEXT.iter().any(|l| l.starts_with('?')));
    }
}

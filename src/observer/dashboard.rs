//! Live terminal dashboard observer: a per-tick agent table and status line
//! rendered with `ratatui`+`crossterm`.

use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::Terminal;
use std::io::Stdout;

use super::{Observer, RunOutcome, Snapshot};

/// Renders agent state to a `ratatui` terminal every tick. Terminal setup/teardown
/// (raw mode, alternate screen) is the caller's responsibility — this observer only
/// draws frames.
pub struct DashboardObserver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl DashboardObserver {
    pub fn new(terminal: Terminal<CrosstermBackend<Stdout>>) -> Self {
        Self { terminal }
    }
}

impl Observer for DashboardObserver {
    fn on_tick(&mut self, snapshot: &Snapshot) {
        let tick = snapshot.tick;
        let rows: Vec<Row> = (0..snapshot.positions.len())
            .map(|i| {
                let p = snapshot.positions[i];
                Row::new(vec![
                    i.to_string(),
                    format!("{:.1}", p[0]),
                    format!("{:.1}", p[1]),
                    format!("{:.1}", p[2]),
                    format!("{:.1}", snapshot.speeds[i]),
                    format!("{:.2}", snapshot.azimuth_angles[i]),
                ])
            })
            .collect();

        let _ = self.terminal.draw(|frame| {
            let area = frame.area();
            let chunks = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).split(area);

            let header = Paragraph::new(Line::from(format!("tick {tick}")))
                .style(Style::default().fg(Color::Cyan));
            frame.render_widget(header, chunks[0]);

            let table = Table::new(
                rows,
                [
                    Constraint::Length(6),
                    Constraint::Length(10),
                    Constraint::Length(10),
                    Constraint::Length(10),
                    Constraint::Length(8),
                    Constraint::Length(8),
                ],
            )
            .header(Row::new(vec!["agent", "x", "y", "z", "speed", "psi"]))
            .block(Block::default().borders(Borders::ALL).title("agents"));
            frame.render_widget(table, chunks[1]);
        });
    }

    fn on_finish(&mut self, outcome: RunOutcome) {
        let message = match outcome {
            RunOutcome::Captured(evader) => format!("agent {evader} captured"),
            RunOutcome::TickLimitReached => "tick limit reached".to_string(),
            RunOutcome::Interrupted => "interrupted".to_string(),
        };
        let _ = self.terminal.draw(|frame| {
            let area = frame.area();
            let paragraph = Paragraph::new(message).block(Block::default().borders(Borders::ALL).title("run finished"));
            frame.render_widget(paragraph, area);
        });
    }
}

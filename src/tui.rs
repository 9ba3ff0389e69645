use std::io;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap,
};

use crate::app::Atlas;
use crate::error::AtlasError;
use crate::filter::{FilterOptions, Selection};
use crate::graph::{GraphDocument, NodeKind};
use crate::session::Navigator;
use crate::view::{AtlasSummary, DatasetDetail, TableRow};

const HINT: &str =
    "Tab focus  ↑↓ move  Space toggle  a all  Enter select  g graph/table  r reload  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Atlas,
    Datasets,
}

impl Page {
    fn title(self) -> &'static str {
        match self {
            Page::Atlas => "Atlas",
            Page::Datasets => "All datasets",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Robots,
    Environments,
    Main,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Robots => Focus::Environments,
            Focus::Environments => Focus::Main,
            Focus::Main => Focus::Robots,
        }
    }
}

/// A graph node as listed on the Atlas page.
#[derive(Debug, Clone)]
struct NodeLine {
    id: String,
    kind: NodeKind,
    text: String,
    degree: usize,
}

/// Everything recomputed from the atlas after a filter change.
#[derive(Debug, Default)]
struct Snapshot {
    options: FilterOptions,
    summary: Option<AtlasSummary>,
    rows: Vec<TableRow>,
    nodes: Vec<NodeLine>,
}

pub struct Tui {
    page: Page,
    focus: Focus,
    selection: Option<Selection>,
    robot_cursor: usize,
    environment_cursor: usize,
    main_cursor: usize,
    detail: Option<DatasetDetail>,
    status: String,
    snapshot: Snapshot,
    dirty: bool,
}

impl Default for Tui {
    fn default() -> Self {
        Self::new()
    }
}

impl Tui {
    pub fn new() -> Self {
        Self {
            page: Page::Atlas,
            focus: Focus::Main,
            selection: None,
            robot_cursor: 0,
            environment_cursor: 0,
            main_cursor: 0,
            detail: None,
            status: "ready".to_string(),
            snapshot: Snapshot::default(),
            dirty: true,
        }
    }

    pub fn run<N: Navigator>(&mut self, atlas: &mut Atlas<N>) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        self.status = format!("source: {}", atlas.config().source);
        let result = self.event_loop(&mut terminal, atlas);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop<N: Navigator>(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        atlas: &mut Atlas<N>,
    ) -> miette::Result<()> {
        loop {
            if self.dirty {
                self.refresh(atlas)?;
            }
            terminal
                .draw(|frame| draw_ui(frame, self))
                .into_diagnostic()?;

            if event::poll(Duration::from_millis(120)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    if self.handle_key(key, atlas)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn refresh<N: Navigator>(&mut self, atlas: &mut Atlas<N>) -> Result<(), AtlasError> {
        let options = atlas.options()?;
        let selection = self
            .selection
            .get_or_insert_with(|| Selection::all(&options))
            .clone();
        let rows = atlas.table(&selection)?;
        let document = atlas.graph(&selection)?;
        let summary = atlas.summary(&selection)?;

        self.snapshot = Snapshot {
            options,
            summary: Some(summary),
            rows,
            nodes: node_lines(&document),
        };
        self.robot_cursor = clamp(self.robot_cursor, self.snapshot.options.robots.len());
        self.environment_cursor = clamp(
            self.environment_cursor,
            self.snapshot.options.environments.len(),
        );
        self.main_cursor = clamp(self.main_cursor, self.main_len());
        self.dirty = false;
        Ok(())
    }

    fn main_len(&self) -> usize {
        match self.page {
            Page::Atlas => self.snapshot.nodes.len(),
            Page::Datasets => self.snapshot.rows.len(),
        }
    }

    fn handle_key<N: Navigator>(
        &mut self,
        key: KeyEvent,
        atlas: &mut Atlas<N>,
    ) -> Result<bool, AtlasError> {
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::Char('g') => {
                self.page = match self.page {
                    Page::Atlas => Page::Datasets,
                    Page::Datasets => Page::Atlas,
                };
                self.main_cursor = 0;
            }
            KeyCode::Char('r') => {
                atlas.reload();
                self.selection = None;
                self.status = "reloaded dataset source".to_string();
                self.dirty = true;
            }
            KeyCode::Char('a') => {
                self.selection = Some(Selection::all(&self.snapshot.options));
                self.dirty = true;
            }
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Char(' ') => self.toggle_current(),
            KeyCode::Enter => self.click_current(atlas)?,
            _ => {}
        }
        Ok(false)
    }

    fn move_cursor(&mut self, delta: isize) {
        let (cursor, len) = match self.focus {
            Focus::Robots => (&mut self.robot_cursor, self.snapshot.options.robots.len()),
            Focus::Environments => (
                &mut self.environment_cursor,
                self.snapshot.options.environments.len(),
            ),
            Focus::Main => {
                let len = self.main_len();
                (&mut self.main_cursor, len)
            }
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(delta).min(len - 1);
    }

    fn toggle_current(&mut self) {
        let Some(selection) = self.selection.as_mut() else {
            return;
        };
        match self.focus {
            Focus::Robots => {
                if let Some(robot) = self.snapshot.options.robots.get(self.robot_cursor) {
                    selection.toggle_robot(robot);
                    self.dirty = true;
                }
            }
            Focus::Environments => {
                let environments = &self.snapshot.options.environments;
                if let Some(environment) = environments.get(self.environment_cursor) {
                    selection.toggle_environment(environment);
                    self.dirty = true;
                }
            }
            Focus::Main => {}
        }
    }

    fn click_current<N: Navigator>(&mut self, atlas: &mut Atlas<N>) -> Result<(), AtlasError> {
        if self.focus != Focus::Main {
            return Ok(());
        }
        let clicked = match self.page {
            Page::Atlas => self.snapshot.nodes.get(self.main_cursor).map(|n| n.id.clone()),
            Page::Datasets => self.snapshot.rows.get(self.main_cursor).map(|r| r.id.clone()),
        };
        let outcome = atlas.click(clicked.as_deref())?;
        if let Some(detail) = outcome.detail {
            self.status = match (&outcome.navigation_error, outcome.navigated) {
                (Some(err), _) => format!("could not open URL: {err}"),
                (None, true) => format!("opened {}", detail.url.as_deref().unwrap_or_default()),
                (None, false) => format!("selected {}", detail.name),
            };
            self.detail = Some(detail);
        } else if let Some(id) = clicked {
            self.status = format!("{id} is an attribute node");
        }
        Ok(())
    }
}

fn node_lines(document: &GraphDocument) -> Vec<NodeLine> {
    let graph = &document.graph;
    graph
        .nodes
        .iter()
        .map(|node| {
            let text = match node.kind {
                NodeKind::Dataset => node.label.clone(),
                _ => node.title.clone(),
            };
            NodeLine {
                id: node.id.clone(),
                kind: node.kind,
                text,
                degree: graph.edges_of(&node.id).count(),
            }
        })
        .collect()
}

fn clamp(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

fn kind_color(kind: NodeKind) -> Color {
    match kind {
        NodeKind::Dataset => Color::Rgb(0x00, 0xC4, 0x9F),
        NodeKind::Robot => Color::Rgb(0xFF, 0xBB, 0x28),
        NodeKind::Environment => Color::Rgb(0xFF, 0x80, 0x42),
        NodeKind::Format => Color::Rgb(0x88, 0x84, 0xd8),
    }
}

fn focus_block(title: String, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn draw_ui(frame: &mut ratatui::Frame, tui: &Tui) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, tui, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(28), Constraint::Percentage(72)])
        .split(chunks[1]);
    draw_sidebar(frame, tui, body[0]);

    let main = if tui.detail.is_some() {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(9)])
            .split(body[1])
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6)])
            .split(body[1])
    };
    match tui.page {
        Page::Atlas => draw_graph(frame, tui, main[0]),
        Page::Datasets => draw_table(frame, tui, main[0]),
    }
    if let Some(detail) = &tui.detail {
        draw_detail(frame, detail, main[1]);
    }

    let footer = Paragraph::new(vec![
        Line::from(Span::styled(
            tui.status.clone(),
            Style::default().fg(Color::Yellow),
        )),
        Line::from(Span::styled(HINT, Style::default().fg(Color::DarkGray))),
    ]);
    frame.render_widget(footer, chunks[2]);
}

fn draw_header(frame: &mut ratatui::Frame, tui: &Tui, area: Rect) {
    let headline = tui
        .snapshot
        .summary
        .as_ref()
        .map(|summary| summary.headline())
        .unwrap_or_else(|| "Showing 0 datasets".to_string());
    let line = Line::from(vec![
        Span::styled(
            "RoboData Atlas",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::raw(tui.page.title()),
        Span::raw("  |  "),
        Span::styled(headline, Style::default().fg(Color::Green)),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_sidebar(frame: &mut ratatui::Frame, tui: &Tui, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let selection = tui.selection.as_ref();
    let robots = checklist(&tui.snapshot.options.robots, |robot| {
        selection.map(|s| s.robots.contains(robot)).unwrap_or(true)
    });
    let mut robot_state = ListState::default().with_selected(Some(tui.robot_cursor));
    frame.render_stateful_widget(
        List::new(robots)
            .block(focus_block(
                "Robot Hardware".to_string(),
                tui.focus == Focus::Robots,
            ))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
        halves[0],
        &mut robot_state,
    );

    let environments = checklist(&tui.snapshot.options.environments, |environment| {
        selection
            .map(|s| s.environments.contains(environment))
            .unwrap_or(true)
    });
    let mut environment_state = ListState::default().with_selected(Some(tui.environment_cursor));
    frame.render_stateful_widget(
        List::new(environments)
            .block(focus_block(
                "Environment".to_string(),
                tui.focus == Focus::Environments,
            ))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
        halves[1],
        &mut environment_state,
    );
}

fn checklist<'a>(values: &'a [String], checked: impl Fn(&str) -> bool) -> Vec<ListItem<'a>> {
    values
        .iter()
        .map(|value| {
            let mark = if checked(value) { "[x]" } else { "[ ]" };
            ListItem::new(format!("{mark} {value}"))
        })
        .collect()
}

fn draw_graph(frame: &mut ratatui::Frame, tui: &Tui, area: Rect) {
    let items: Vec<ListItem> = tui
        .snapshot
        .nodes
        .iter()
        .map(|node| {
            let marker = Span::styled("● ", Style::default().fg(kind_color(node.kind)));
            let text = Span::raw(node.text.replace('\n', " "));
            let degree = Span::styled(
                format!("  ({} links)", node.degree),
                Style::default().fg(Color::DarkGray),
            );
            ListItem::new(Line::from(vec![marker, text, degree]))
        })
        .collect();
    let title = format!(
        "Atlas graph: {} nodes (● dataset ● robot ● environment ● format)",
        tui.snapshot.nodes.len()
    );
    let mut state = ListState::default().with_selected(Some(tui.main_cursor));
    frame.render_stateful_widget(
        List::new(items)
            .block(focus_block(title, tui.focus == Focus::Main))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
        area,
        &mut state,
    );
}

fn draw_table(frame: &mut ratatui::Frame, tui: &Tui, area: Rect) {
    let header = Row::new(vec![
        "ID",
        "Name",
        "Robot",
        "Environment",
        "Format",
        "Frequency",
        "Sensors",
        "Views",
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = tui.snapshot.rows.iter().map(|row| {
        Row::new(vec![
            row.id.clone(),
            row.name.clone(),
            row.robot.clone(),
            row.environment.clone(),
            row.format.clone(),
            row.frequency.clone(),
            row.sensors.clone(),
            row.views.clone(),
        ])
    });
    let widths = [
        Constraint::Percentage(12),
        Constraint::Percentage(20),
        Constraint::Percentage(14),
        Constraint::Percentage(12),
        Constraint::Percentage(10),
        Constraint::Percentage(8),
        Constraint::Percentage(14),
        Constraint::Percentage(10),
    ];
    let highlight = if tui.focus == Focus::Main {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(highlight)
        .block(focus_block(
            format!("All datasets ({})", tui.snapshot.rows.len()),
            tui.focus == Focus::Main,
        ));
    let mut state = TableState::default().with_selected(Some(tui.main_cursor));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_detail(frame: &mut ratatui::Frame, detail: &DatasetDetail, area: Rect) {
    let mut lines = vec![
        Line::from(format!("Robot: {}   Gripper: {}", detail.robot, detail.gripper)),
        Line::from(format!(
            "Sensors: {}   Views: {}",
            detail.sensors.join(", "),
            detail.views.join(", ")
        )),
        Line::from(format!(
            "Format: {}   Freq: {}",
            detail.format, detail.frequency
        )),
    ];
    if let Some(url) = &detail.url {
        lines.push(Line::from(Span::styled(
            url.clone(),
            Style::default().fg(Color::Blue),
        )));
    }
    if !detail.description.is_empty() {
        lines.push(Line::from(detail.description.clone()));
    }
    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(detail.name.clone()));
    frame.render_widget(panel, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, GraphEdge, GraphNode, NodeVisual};
    use ratatui::backend::TestBackend;

    fn table_row(id: &str) -> TableRow {
        TableRow {
            id: id.to_string(),
            name: format!("{id} dataset"),
            robot: "UR5".to_string(),
            environment: "Kitchen".to_string(),
            format: "RLDS".to_string(),
            frequency: "10 Hz".to_string(),
            sensors: "RGB".to_string(),
            views: "External".to_string(),
            url: String::new(),
        }
    }

    fn screen_text(tui: &Tui) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| draw_ui(frame, tui)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn table_page_scrolls_to_cursor() {
        let mut tui = Tui::new();
        tui.page = Page::Datasets;
        tui.snapshot.rows = (0..60).map(|index| table_row(&format!("ds{index:02}"))).collect();
        tui.main_cursor = 45;

        let screen = screen_text(&tui);
        assert!(screen.contains("ds45"));
        assert!(!screen.contains("ds00"));

        tui.main_cursor = 0;
        assert!(screen_text(&tui).contains("ds00"));
    }

    fn node(id: &str, kind: NodeKind, label: &str, title: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind,
            label: label.to_string(),
            title: title.to_string(),
            size: 18,
            visual: NodeVisual::Dot {
                color: kind.color().to_string(),
            },
        }
    }

    #[test]
    fn node_lines_count_incident_edges() {
        let graph = Graph {
            nodes: vec![
                node("a", NodeKind::Dataset, "A", "A\nRobot: UR5"),
                node("robot_UR5", NodeKind::Robot, "UR5", "Robot: UR5"),
            ],
            edges: vec![GraphEdge {
                source: "robot_UR5".to_string(),
                target: "a".to_string(),
                kind: NodeKind::Robot,
                color: NodeKind::Robot.color().to_string(),
                title: "Robot: UR5".to_string(),
                arrows: "to".to_string(),
            }],
        };
        let lines = node_lines(&GraphDocument::new(graph));
        assert_eq!(lines[0].text, "A");
        assert_eq!(lines[1].text, "Robot: UR5");
        assert!(lines.iter().all(|line| line.degree == 1));
    }

    #[test]
    fn clamp_keeps_cursor_in_range() {
        assert_eq!(clamp(5, 3), 2);
        assert_eq!(clamp(1, 3), 1);
        assert_eq!(clamp(4, 0), 0);
    }
}

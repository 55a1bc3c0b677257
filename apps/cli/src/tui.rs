//! Read-only dashboard over the current data directory's file-backed state.
//!
//! Lists executions, approvals, form triggers, and archives in tabs; does
//! not mutate anything. `Tab`/`Left`/`Right` switches tabs, `Up`/`Down`
//! moves the selection, `q`/`Esc` quits.

use std::io::stdout;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Tabs},
};

use crate::app::AppContext;

const TAB_TITLES: [&str; 4] = ["Executions", "Approvals", "Forms", "Archives"];

struct Dashboard {
    tab: usize,
    rows: [Vec<String>; 4],
    state: ListState,
}

impl Dashboard {
    async fn load(ctx: &AppContext) -> anyhow::Result<Self> {
        use nebula_persistence::ExecutionRepository;
        let executions: Vec<String> = ctx
            .executions
            .list()
            .await?
            .into_iter()
            .map(|e| format!("{}  {:?}  workflow={}", e.execution_id, e.status, e.workflow_id))
            .collect();

        let approvals: Vec<String> = ctx
            .approvals
            .all()
            .into_iter()
            .map(|a| format!("{}  {:?}  execution={}", a.approval_id, a.status, a.execution_id))
            .collect();

        let forms: Vec<String> = ctx
            .forms
            .all()
            .into_iter()
            .map(|t| format!("{}  token={}  active={}", t.trigger_id, t.token, t.active))
            .collect();

        let archives: Vec<String> = ctx
            .archives
            .all()
            .into_iter()
            .map(|a| format!("{}  execution={}  {:?}", a.archive_id, a.execution_id, a.status))
            .collect();

        let mut state = ListState::default();
        state.select(Some(0));

        Ok(Self {
            tab: 0,
            rows: [executions, approvals, forms, archives],
            state,
        })
    }

    fn current_rows(&self) -> &[String] {
        &self.rows[self.tab]
    }

    fn set_tab(&mut self, tab: usize) {
        self.tab = tab;
        self.state.select(if self.current_rows().is_empty() { None } else { Some(0) });
    }

    fn select_next(&mut self) {
        let len = self.current_rows().len();
        if len == 0 {
            return;
        }
        let next = self.state.selected().map_or(0, |i| (i + 1) % len);
        self.state.select(Some(next));
    }

    fn select_previous(&mut self) {
        let len = self.current_rows().len();
        if len == 0 {
            return;
        }
        let prev = self.state.selected().map_or(0, |i| if i == 0 { len - 1 } else { i - 1 });
        self.state.select(Some(prev));
    }
}

/// Run the dashboard until the user quits. Takes the terminal over in raw,
/// alternate-screen mode for the duration and restores it on the way out,
/// including on error.
pub async fn run(ctx: &AppContext) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::load(ctx).await?;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = event_loop(&mut terminal, &mut dashboard);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, dashboard: &mut Dashboard) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, dashboard))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab | KeyCode::Right => dashboard.set_tab((dashboard.tab + 1) % TAB_TITLES.len()),
                KeyCode::Left => dashboard.set_tab((dashboard.tab + TAB_TITLES.len() - 1) % TAB_TITLES.len()),
                KeyCode::Down => dashboard.select_next(),
                KeyCode::Up => dashboard.select_previous(),
                _ => {}
            }
        }
    }
}

fn draw(frame: &mut Frame, dashboard: &mut Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(frame.area());

    let tabs = Tabs::new(TAB_TITLES.to_vec())
        .block(Block::default().borders(Borders::ALL).title("nebula dashboard"))
        .select(dashboard.tab)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));
    frame.render_widget(tabs, chunks[0]);

    let items: Vec<ListItem> = dashboard.current_rows().iter().map(|row| ListItem::new(row.as_str())).collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(TAB_TITLES[dashboard.tab]))
        .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");
    frame.render_stateful_widget(list, chunks[1], &mut dashboard.state);
}

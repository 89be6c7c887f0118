use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use armytui_core::{
    catalog::CatalogLoader,
    config::AppConfig,
    events::{CatalogEvent, EventSubscription},
    models::{Age, Composition, LimitMode, PlannerConfig, Resource, UnitInfo},
    planner::{self, LimitBreach, PlanSummary},
    prefs::{Preferences, PrefsStore},
    save::{PlanEntry, PlanManager},
    share::{self, ShareError},
};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_PROMPT_LEN: usize = 256;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug)]
enum AppEvent {
    Input(Event),
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Plan,
    Saves,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    SavePlan,
    ImportToken,
    PopulationCap,
    TotalLimit,
}

#[derive(Debug, Clone)]
struct TextPrompt {
    kind: PromptKind,
    title: &'static str,
    input: String,
    cursor: usize,
}

impl TextPrompt {
    fn new(kind: PromptKind, title: &'static str, initial: String) -> Self {
        let cursor = initial.len();
        Self {
            kind,
            title,
            input: initial,
            cursor,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= MAX_PROMPT_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.input.insert(self.cursor, ch);
            self.cursor += ch.len_utf8();
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }
}

pub struct PlannerApp {
    config: AppConfig,
    catalog: CatalogLoader,
    catalog_events: EventSubscription<CatalogEvent>,
    prefs_store: PrefsStore,
    prefs: Preferences,
    plan_manager: PlanManager,

    composition: Composition,
    planner_config: PlannerConfig,

    units: Vec<UnitInfo>,
    filter: String,
    cursor: usize,

    saves: Vec<PlanEntry>,
    saves_cursor: usize,

    screen: Screen,
    mode: Mode,
    prompt: Option<TextPrompt>,
    share_popup: Option<String>,
    show_notice: bool,

    status: String,
    should_quit: bool,
    theme: Theme,
}

impl PlannerApp {
    pub fn new(
        config: AppConfig,
        catalog: CatalogLoader,
        prefs_store: PrefsStore,
        plan_manager: PlanManager,
    ) -> Self {
        let catalog_events = catalog.subscribe();
        let prefs = match prefs_store.load() {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!("Failed to load preferences: {err:#}");
                Preferences::default()
            }
        };

        let mut planner_config = PlannerConfig::default();
        if let Some(civ) = prefs.last_civilization.clone() {
            planner_config.civilization = civ;
        }
        if let Some(age) = prefs.last_age.clone() {
            planner_config.age = age;
        }
        let show_notice = prefs.should_show_support_notice(Utc::now());

        Self {
            config,
            catalog,
            catalog_events,
            prefs_store,
            prefs,
            plan_manager,
            composition: Composition::new(),
            planner_config,
            units: Vec::new(),
            filter: String::new(),
            cursor: 0,
            saves: Vec::new(),
            saves_cursor: 0,
            screen: Screen::Plan,
            mode: Mode::Browse,
            prompt: None,
            share_popup: None,
            show_notice,
            status: "Ready".to_string(),
            should_quit: false,
            theme: Theme::default(),
        }
    }

    /// Import a plan from a pasted share URL or bare token.
    pub fn import_input(&mut self, input: &str) {
        let Some(token) = share::token_from_url(input) else {
            self.set_status("No share token found in that link".to_string());
            return;
        };
        match share::decode(token) {
            Ok((composition, config)) => {
                let units = composition.len();
                self.composition = composition;
                self.planner_config = config;
                self.rebuild_units();
                info!(units, "imported shared plan");
                self.set_status(format!("Imported shared plan ({units} unit types)"));
            }
            Err(ShareError::UnsupportedVersion(tag)) => {
                self.set_status(format!(
                    "Link was made by an incompatible version (tag {tag}); keeping current plan"
                ));
            }
            Err(_) => {
                self.set_status("That link is not a valid army share link".to_string());
            }
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.rebuild_units();
        if let Err(err) = self.refresh_saves() {
            self.set_status(format!("Failed to read saved plans: {err}"));
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }

            if self.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.persist_prefs();
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Event::Key(key) = event {
                    if let Err(err) = self.handle_key(key) {
                        error!("Key handling failed: {err:#}");
                        self.set_status(format!("Error: {err}"));
                    }
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            None => false,
        }
    }

    fn handle_tick(&mut self) {
        if let Some(CatalogEvent::Reloaded) = self.catalog_events.try_next() {
            self.rebuild_units();
            self.set_status(format!("Catalog reloaded ({} units)", self.units.len()));
        }
        if self.mode == Mode::Filter {
            self.set_status(format!("Filter: {}", self.filter));
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.share_popup.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.share_popup = None;
            }
            return Ok(());
        }
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }
        match self.screen {
            Screen::Plan => match self.mode {
                Mode::Filter => self.handle_filter_key(key),
                Mode::Browse => self.handle_plan_key(key),
            },
            Screen::Saves => self.handle_saves_key(key),
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                self.filter.clear();
                self.rebuild_units();
                self.set_status("Filter cancelled".to_string());
            }
            KeyCode::Enter => {
                self.mode = Mode::Browse;
                self.set_status(format!("Filter applied: {}", self.filter));
            }
            KeyCode::Backspace => {
                self.filter.pop();
                self.rebuild_units();
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.filter.push(c);
                    self.rebuild_units();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_plan_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('g') if key.modifiers.is_empty() => self.cursor = 0,
            KeyCode::Char('G') => self.cursor = self.units.len().saturating_sub(1),
            KeyCode::Char('/') => {
                self.mode = Mode::Filter;
                self.set_status("Enter filter text".to_string());
            }
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => self.adjust_selected(1),
            KeyCode::Char('-') | KeyCode::Left => self.adjust_selected(-1),
            KeyCode::Char('>') => self.adjust_selected(10),
            KeyCode::Char('<') => self.adjust_selected(-10),
            KeyCode::Delete => {
                if let Some(unit) = self.selected_unit() {
                    let id = unit.id.clone();
                    self.composition.set(&id, 0);
                    self.set_status(format!("Removed {id}"));
                }
            }
            KeyCode::Char('X') => {
                self.composition.clear();
                self.set_status("Composition cleared".to_string());
            }
            KeyCode::Char('a') => self.cycle_age(),
            KeyCode::Char('c') => self.cycle_civilization(),
            KeyCode::Char('m') => {
                self.planner_config.mode = match self.planner_config.mode {
                    LimitMode::Individual => LimitMode::Total,
                    LimitMode::Total => LimitMode::Individual,
                };
                self.set_status(format!("Limit mode: {}", self.planner_config.mode));
            }
            KeyCode::Char('p') => {
                self.prompt = Some(TextPrompt::new(
                    PromptKind::PopulationCap,
                    "Population cap (0 = none)",
                    self.planner_config.population_cap.to_string(),
                ));
            }
            KeyCode::Char('t') => {
                self.prompt = Some(TextPrompt::new(
                    PromptKind::TotalLimit,
                    "Total resource limit (0 = none)",
                    self.planner_config.total_limit.to_string(),
                ));
            }
            KeyCode::Char('s') => self.open_share_popup(),
            KeyCode::Char('i') => {
                self.prompt = Some(TextPrompt::new(
                    PromptKind::ImportToken,
                    "Paste share link or token",
                    String::new(),
                ));
            }
            KeyCode::Char('w') => {
                self.prompt = Some(TextPrompt::new(
                    PromptKind::SavePlan,
                    "Plan name",
                    String::new(),
                ));
            }
            KeyCode::Char('d') if self.show_notice => {
                self.show_notice = false;
                self.prefs.dismiss_support_notice(Utc::now());
                if let Err(err) = self.prefs_store.save(&self.prefs) {
                    warn!("Failed to persist preferences: {err:#}");
                }
                self.set_status("Notice dismissed".to_string());
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.catalog.refresh();
            }
            KeyCode::Tab => {
                if let Err(err) = self.refresh_saves() {
                    self.set_status(format!("Failed to read saved plans: {err}"));
                } else {
                    self.screen = Screen::Saves;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_saves_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Tab => self.screen = Screen::Plan,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.saves_cursor + 1 < self.saves.len() {
                    self.saves_cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.saves_cursor = self.saves_cursor.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(entry) = self.saves.get(self.saves_cursor).cloned() {
                    let payload = self.plan_manager.load(&entry)?;
                    let name = payload.name().to_string();
                    let (composition, config) = payload.into_parts();
                    self.composition = composition;
                    self.planner_config = config;
                    self.rebuild_units();
                    self.screen = Screen::Plan;
                    self.set_status(format!("Loaded plan: {name}"));
                }
            }
            KeyCode::Char('d') => {
                if let Some(entry) = self.saves.get(self.saves_cursor).cloned() {
                    self.plan_manager.delete(&entry)?;
                    self.refresh_saves()?;
                    self.set_status(format!("Deleted plan: {}", entry.name));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(prompt) = self.prompt.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                self.set_status("Cancelled".to_string());
            }
            KeyCode::Enter => {
                let prompt = self.prompt.take().expect("prompt checked above");
                self.submit_prompt(prompt)?;
            }
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.cursor = 0,
            KeyCode::End => prompt.cursor = prompt.input.len(),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Char(c) => prompt.insert(c),
            _ => {}
        }
        Ok(())
    }

    fn submit_prompt(&mut self, prompt: TextPrompt) -> Result<()> {
        let value = prompt.input.trim().to_string();
        match prompt.kind {
            PromptKind::SavePlan => {
                let entry =
                    self.plan_manager
                        .create(&value, &self.composition, &self.planner_config)?;
                self.refresh_saves()?;
                self.set_status(format!("Saved plan: {}", entry.name));
            }
            PromptKind::ImportToken => self.import_input(&value),
            PromptKind::PopulationCap => match value.parse::<u32>() {
                Ok(cap) => {
                    self.planner_config.population_cap = cap;
                    self.set_status(format!("Population cap: {cap}"));
                }
                Err(_) => self.set_status(format!("Not a number: {value}")),
            },
            PromptKind::TotalLimit => match value.parse::<u32>() {
                Ok(cap) => {
                    self.planner_config.total_limit = cap;
                    self.set_status(format!("Total resource limit: {cap}"));
                }
                Err(_) => self.set_status(format!("Not a number: {value}")),
            },
        }
        Ok(())
    }

    fn open_share_popup(&mut self) {
        match share::share_url(
            &self.config.share_base_url,
            &self.composition,
            &self.planner_config,
        ) {
            Ok(url) => {
                info!(len = url.len(), "generated share link");
                self.share_popup = Some(url);
            }
            Err(err) => {
                error!("Share link generation failed: {err}");
                self.set_status("Could not generate a share link".to_string());
            }
        }
    }

    fn selected_unit(&self) -> Option<&UnitInfo> {
        self.units.get(self.cursor)
    }

    fn adjust_selected(&mut self, delta: i64) {
        if let Some(unit) = self.selected_unit() {
            let id = unit.id.clone();
            self.composition.adjust(&id, delta);
            self.set_status(format!("{id}: {}", self.composition.quantity(&id)));
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.units.is_empty() {
            self.cursor = 0;
            return;
        }
        let len = self.units.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len - 1);
        self.cursor = next as usize;
    }

    fn cycle_age(&mut self) {
        let next = match self.planner_config.age_known() {
            Some(age) => {
                let idx = Age::ALL.iter().position(|known| *known == age).unwrap_or(0);
                Age::ALL[(idx + 1) % Age::ALL.len()]
            }
            // Unknown tag (e.g. from an imported link); restart the cycle.
            None => Age::Dark,
        };
        self.planner_config.age = next.tag().to_string();
        self.rebuild_units();
        self.set_status(format!("Age: {next}"));
    }

    fn cycle_civilization(&mut self) {
        let civilizations = self.catalog.civilizations();
        if civilizations.is_empty() {
            return;
        }
        let next = match civilizations
            .iter()
            .position(|civ| *civ == self.planner_config.civilization)
        {
            Some(idx) => civilizations[(idx + 1) % civilizations.len()].clone(),
            None => civilizations[0].clone(),
        };
        self.planner_config.civilization = next.clone();
        self.set_status(format!("Civilization: {next}"));
    }

    fn rebuild_units(&mut self) {
        let mut units = self.catalog.units_matching(&self.filter);
        if let Some(age) = self.planner_config.age_known() {
            units.retain(|unit| unit.age <= age);
        }
        self.units = units;
        if self.cursor >= self.units.len() {
            self.cursor = self.units.len().saturating_sub(1);
        }
    }

    fn refresh_saves(&mut self) -> Result<()> {
        self.saves = self.plan_manager.entries()?;
        if self.saves_cursor >= self.saves.len() {
            self.saves_cursor = self.saves.len().saturating_sub(1);
        }
        Ok(())
    }

    fn persist_prefs(&mut self) {
        self.prefs.last_civilization = Some(self.planner_config.civilization.clone());
        self.prefs.last_age = Some(self.planner_config.age.clone());
        if let Err(err) = self.prefs_store.save(&self.prefs) {
            warn!("Failed to persist preferences: {err:#}");
        }
    }

    fn set_status(&mut self, status: String) {
        self.status = status;
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Plan => self.draw_plan(frame),
            Screen::Saves => self.draw_saves(frame),
        }
        if let Some(prompt) = self.prompt.clone() {
            self.render_prompt(frame, &prompt);
        }
        if let Some(url) = self.share_popup.clone() {
            self.render_share_popup(frame, &url);
        }
    }

    fn draw_plan(&mut self, frame: &mut Frame) {
        let size = frame.size();

        let mut constraints = Vec::new();
        if self.show_notice {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Min(8));
        constraints.push(Constraint::Length(3));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(size);

        let mut chunk_iter = chunks.iter();
        if self.show_notice {
            if let Some(area) = chunk_iter.next() {
                self.render_notice(frame, *area);
            }
        }
        let body_chunk = chunk_iter.next().copied().unwrap_or(size);
        let status_chunk = chunk_iter.next().copied().unwrap_or(size);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(body_chunk);

        self.render_unit_list(frame, body[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(9)])
            .split(body[1]);
        self.render_composition(frame, right[0]);
        self.render_totals(frame, right[1]);

        self.render_status(frame, status_chunk);
    }

    fn render_notice(&self, frame: &mut Frame, area: Rect) {
        let text = Line::from(vec![
            Span::styled(
                "Enjoying armytui? ",
                Style::default().fg(self.theme.primary_fg),
            ),
            Span::styled(
                "Star the project or share a plan with friends.",
                Style::default().fg(self.theme.accent),
            ),
            Span::styled("  [d] dismiss", Style::default().fg(self.theme.muted)),
        ]);
        let notice = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Support"))
            .alignment(Alignment::Center);
        frame.render_widget(notice, area);
    }

    fn render_unit_list(&mut self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .units
            .iter()
            .map(|unit| {
                let quantity = self.composition.quantity(&unit.id);
                let mut spans = vec![Span::styled(
                    format!("{:<24}", unit.name),
                    Style::default().fg(self.theme.primary_fg),
                )];
                spans.push(Span::styled(
                    format!("{:<9}", unit.age.tag()),
                    Style::default().fg(self.theme.muted),
                ));
                if quantity > 0 {
                    spans.push(Span::styled(
                        format!("x{quantity}"),
                        Style::default()
                            .fg(self.theme.success)
                            .add_modifier(Modifier::BOLD),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let title = if self.filter.is_empty() {
            format!("Units ({})", self.units.len())
        } else {
            format!("Units ({}) /{}", self.units.len(), self.filter)
        };

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut state = ListState::default();
        if !self.units.is_empty() {
            state.select(Some(self.cursor));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_composition(&self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        for (unit_id, quantity) in self.composition.iter() {
            let (name, cost_text) = match self.catalog.unit(unit_id) {
                Some(unit) => {
                    let cost = unit.cost.scale(quantity);
                    (
                        unit.name,
                        format!(
                            "{}f {}w {}g {}s",
                            cost.food, cost.wood, cost.gold, cost.stone
                        ),
                    )
                }
                None => (format!("{unit_id} (unknown)"), "-".to_string()),
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<24}", name),
                    Style::default().fg(self.theme.primary_fg),
                ),
                Span::styled(
                    format!("x{:<5}", quantity),
                    Style::default().fg(self.theme.accent),
                ),
                Span::styled(cost_text, Style::default().fg(self.theme.muted)),
            ]));
        }
        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "No units yet. Use +/- on the unit list.",
                Style::default().fg(self.theme.muted),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Composition"));
        frame.render_widget(paragraph, area);
    }

    fn render_totals(&self, frame: &mut Frame, area: Rect) {
        let summary = planner::summarize(&self.composition, &self.catalog);
        let breaches = planner::check(&self.planner_config, &summary);

        let mut lines = Vec::new();
        for resource in Resource::ALL {
            lines.push(self.resource_line(resource, &summary, &breaches));
        }
        lines.push(self.total_line(&summary, &breaches));
        lines.push(self.population_line(&summary, &breaches));
        lines.push(Line::from(Span::styled(
            format!(
                "mode {}  age {}  civ {}",
                self.planner_config.mode, self.planner_config.age, self.planner_config.civilization
            ),
            Style::default().fg(self.theme.muted),
        )));

        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Totals"));
        frame.render_widget(paragraph, area);
    }

    fn resource_line(
        &self,
        resource: Resource,
        summary: &PlanSummary,
        breaches: &[LimitBreach],
    ) -> Line<'static> {
        let spent = summary.cost.get(resource);
        let cap = self.planner_config.limits.get(resource);
        let breached = breaches
            .iter()
            .any(|breach| matches!(breach, LimitBreach::Resource { resource: r, .. } if *r == resource));
        let color = if breached {
            self.theme.danger
        } else {
            self.theme.primary_fg
        };
        let cap_text = match (self.planner_config.mode, cap) {
            (LimitMode::Individual, cap) if cap > 0 => format!(" / {cap}"),
            _ => String::new(),
        };
        Line::from(Span::styled(
            format!("{:<6} {spent}{cap_text}", resource.tag()),
            Style::default().fg(color),
        ))
    }

    fn total_line(&self, summary: &PlanSummary, breaches: &[LimitBreach]) -> Line<'static> {
        let breached = breaches
            .iter()
            .any(|breach| matches!(breach, LimitBreach::TotalResources { .. }));
        let color = if breached {
            self.theme.danger
        } else {
            self.theme.primary_fg
        };
        let cap_text = match (self.planner_config.mode, self.planner_config.total_limit) {
            (LimitMode::Total, cap) if cap > 0 => format!(" / {cap}"),
            _ => String::new(),
        };
        Line::from(Span::styled(
            format!("total  {}{cap_text}", summary.cost.total()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
    }

    fn population_line(&self, summary: &PlanSummary, breaches: &[LimitBreach]) -> Line<'static> {
        let breached = breaches
            .iter()
            .any(|breach| matches!(breach, LimitBreach::Population { .. }));
        let color = if breached {
            self.theme.danger
        } else {
            self.theme.primary_fg
        };
        let cap_text = if self.planner_config.population_cap > 0 {
            format!(" / {}", self.planner_config.population_cap)
        } else {
            String::new()
        };
        Line::from(Span::styled(
            format!("pop    {}{cap_text}", summary.population),
            Style::default().fg(color),
        ))
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let hints = match self.screen {
            Screen::Plan => "+/- qty  / filter  a age  c civ  m mode  s share  i import  w save  Tab plans  q quit",
            Screen::Saves => "Enter load  d delete  Tab back  q quit",
        };
        let lines = vec![
            Line::from(Span::styled(
                self.status.clone(),
                Style::default().fg(self.theme.warning),
            )),
            Line::from(Span::styled(hints, Style::default().fg(self.theme.muted))),
        ];
        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::TOP));
        frame.render_widget(paragraph, area);
    }

    fn draw_saves(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(size);

        let items: Vec<ListItem> = self
            .saves
            .iter()
            .map(|entry| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<32}", entry.name),
                        Style::default().fg(self.theme.primary_fg),
                    ),
                    Span::styled(
                        entry.saved_at.format("%Y-%m-%d %H:%M").to_string(),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Saved plans ({})", self.saves.len())),
            )
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut state = ListState::default();
        if !self.saves.is_empty() {
            state.select(Some(self.saves_cursor));
        }
        frame.render_stateful_widget(list, chunks[0], &mut state);
        self.render_status(frame, chunks[1]);
    }

    fn render_prompt(&self, frame: &mut Frame, prompt: &TextPrompt) {
        let area = centered_rect(60, 5, frame.size());
        frame.render_widget(Clear, area);

        let before = &prompt.input[..prompt.cursor];
        let cursor_char = prompt.input[prompt.cursor..].chars().next().unwrap_or(' ');
        let after: String = prompt.input[prompt.cursor..]
            .chars()
            .skip(1)
            .collect();

        let line = Line::from(vec![
            Span::styled(before.to_string(), Style::default().fg(self.theme.primary_fg)),
            Span::styled(
                cursor_char.to_string(),
                Style::default()
                    .bg(self.theme.accent)
                    .fg(Color::Black),
            ),
            Span::styled(after, Style::default().fg(self.theme.primary_fg)),
        ]);

        let paragraph = Paragraph::new(vec![
            line,
            Line::from(Span::styled(
                "Enter confirm · Esc cancel",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title(prompt.title));
        frame.render_widget(paragraph, area);
    }

    fn render_share_popup(&self, frame: &mut Frame, url: &str) {
        let area = centered_rect(70, 8, frame.size());
        frame.render_widget(Clear, area);

        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                "Copy this link to share your plan:",
                Style::default().fg(self.theme.primary_fg),
            )),
            Line::from(""),
            Line::from(Span::styled(
                url.to_string(),
                Style::default().fg(self.theme.accent),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Share"))
        .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

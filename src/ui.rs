use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use eb_portal::{
    landing, today, Bill, BillStatus, BillingView, GateField, NavItem, Portal, PortalResult, Route,
    BRAND,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// How long the event loop waits for input before ticking
const TICK_RATE: Duration = Duration::from_millis(100);

pub struct App {
    pub portal: Portal,
    pub history_state: TableState,
    pub notice: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(portal: Portal) -> Self {
        Self {
            portal,
            history_state: TableState::default(),
            notice: None,
            should_quit: false,
        }
    }

    fn billing(&self) -> Option<&BillingView> {
        self.portal.billing()
    }

    fn bill_count(&self) -> usize {
        self.billing().map(|b| b.bills().len()).unwrap_or(0)
    }

    pub fn navigate(&mut self, route: Route) -> PortalResult<()> {
        let resolved = self.portal.navigate(route)?;
        if resolved == Route::Billing && self.history_state.selected().is_none() && self.bill_count() > 0 {
            self.history_state.select(Some(0));
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> PortalResult<()> {
        if self.portal.session.is_login_prompt_visible() {
            return self.handle_gate_key(code, modifiers);
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return Ok(());
            }
            _ => {}
        }

        match self.portal.current_route() {
            Route::Landing => match code {
                KeyCode::Char('l') => match self.portal.session.nav_item() {
                    NavItem::Login => self.portal.open_login(),
                    NavItem::Dashboard => self.navigate(Route::Billing)?,
                },
                KeyCode::Char('d') | KeyCode::Enter => self.navigate(Route::Billing)?,
                _ => {}
            },
            Route::Billing => match code {
                KeyCode::Char('h') => self.navigate(Route::Landing)?,
                KeyCode::Char('p') => self.pay()?,
                KeyCode::Down | KeyCode::Char('j') => self.next(),
                KeyCode::Up | KeyCode::Char('k') => self.previous(),
                KeyCode::Home => self.history_state.select(Some(0)),
                KeyCode::End => {
                    let len = self.bill_count();
                    if len > 0 {
                        self.history_state.select(Some(len - 1));
                    }
                }
                _ => {}
            },
        }

        Ok(())
    }

    fn handle_gate_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> PortalResult<()> {
        match code {
            KeyCode::Esc => self.portal.dismiss_login(),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.portal.gate.focus_next(),
            KeyCode::Backspace => self.portal.gate.pop_char(),
            KeyCode::Enter => {
                // required fields: nothing happens until both are filled
                if self.portal.gate.can_submit() {
                    let outcome = self.portal.submit_login()?;
                    if outcome.is_accepted() {
                        self.notice = None;
                        self.navigate(Route::Billing)?;
                    }
                }
            }
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                self.portal.gate.push_char(c)
            }
            _ => {}
        }
        Ok(())
    }

    fn pay(&mut self) -> PortalResult<()> {
        if let Some(ticket) = self.portal.pay_current_bill(today(), Instant::now())? {
            self.notice = Some(format!("Processing payment for {}...", ticket.bill_id));
        }
        Ok(())
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(bill) = self.portal.tick(now) {
            self.notice = Some(format!(
                "Payment of {} received for {}",
                bill.formatted_amount(),
                bill.id
            ));
        }
    }

    pub fn next(&mut self) {
        let len = self.bill_count();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.history_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.bill_count();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.history_state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "UI loop failed");
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code, key.modifiers)?;
                }
            }
        }

        // settlement continuation fires on this thread
        app.tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.portal.current_route() {
        Route::Landing => render_landing(f, chunks[1]),
        Route::Billing => render_dashboard(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    // The gate is always mounted, but only drawn when requested
    if app.portal.session.is_login_prompt_visible() {
        render_login_modal(f, f.size(), app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let current = app.portal.current_route();

    let mut spans = vec![
        Span::styled(
            format!("⚡ {}", BRAND),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
    ];

    for (i, route) in [Route::Landing, Route::Billing].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *route == current {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(route.title().to_string(), style));
    }

    // 'l' is only bound on the landing page
    if current == Route::Landing {
        let nav = app.portal.session.nav_item();
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("[l] {}", nav.label()),
            Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

// ============================================================================
// LANDING
// ============================================================================

fn render_landing(f: &mut Frame, area: Rect) {
    let content = landing::content();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Hero
            Constraint::Length(6), // Generation sources
            Constraint::Min(0),    // Tips
        ])
        .split(area);

    let hero = Paragraph::new(vec![
        Line::from(Span::styled(
            content.hero.headline,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(content.hero.tagline, Style::default().fg(Color::White))),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(hero, chunks[0]);

    let source_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(chunks[1]);

    for (source, chunk) in content.sources.iter().zip(source_chunks.iter()) {
        let card = Paragraph::new(source.description)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Green))
                    .title(format!(" {} ", source.title)),
            );
        f.render_widget(card, *chunk);
    }

    let mut tip_lines = vec![Line::from("")];
    for tip in content.tips {
        tip_lines.push(Line::from(vec![
            Span::styled(
                format!("  {}: ", tip.title),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(tip.tip),
        ]));
    }

    let tips = Paragraph::new(tip_lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Energy Saving Tips "),
    );
    f.render_widget(tips, chunks[2]);
}

// ============================================================================
// DASHBOARD
// ============================================================================

fn render_dashboard(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(billing) = app.portal.billing() else {
        let empty = Paragraph::new("No billing data")
            .block(Block::default().borders(Borders::ALL).title(" Dashboard "));
        f.render_widget(empty, area);
        return;
    };

    match billing.current_pending_bill() {
        Some(pending) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(11), Constraint::Min(0)])
                .split(area);

            render_current_bill(f, chunks[0], billing, pending);
            render_history(f, chunks[1], billing.bills(), &mut app.history_state);
        }
        None => render_history(f, area, billing.bills(), &mut app.history_state),
    }
}

fn render_current_bill(f: &mut Frame, area: Rect, billing: &BillingView, bill: &Bill) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Current Bill - Payment Due ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let details = Paragraph::new(vec![
        Line::from(vec![Span::styled("  Bill Number: ", label), Span::raw(bill.id.as_str())]),
        Line::from(vec![Span::styled("  Period: ", label), Span::raw(bill.billing_period.as_str())]),
        Line::from(vec![
            Span::styled("  Due Date: ", label),
            Span::styled(bill.due_date.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Amount: ", label),
            Span::styled(
                bill.formatted_amount(),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title(" Bill Details "));
    f.render_widget(details, columns[0]);

    let percent = billing.usage_percent(bill);
    let usage = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Usage Overview "))
        .gauge_style(Style::default().fg(Color::Blue).bg(Color::DarkGray))
        .percent(percent.round() as u16)
        .label(format!("{} kWh", bill.usage_kwh));
    f.render_widget(usage, columns[1]);

    let action = if billing.is_processing() {
        Span::styled(
            " Processing Payment... ",
            Style::default().fg(Color::Black).bg(Color::Gray),
        )
    } else {
        Span::styled(
            " [p] Pay Now ",
            Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD),
        )
    };
    f.render_widget(
        Paragraph::new(Line::from(action)).alignment(Alignment::Center),
        rows[1],
    );
}

fn render_history(f: &mut Frame, area: Rect, bills: &[Bill], state: &mut TableState) {
    let header_cells = ["Period", "Bill Number", "Amount", "Usage", "Due Date", "Status", "Paid On"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = bills.iter().map(|bill| {
        let color = match bill.status {
            BillStatus::Pending => Color::Yellow,
            BillStatus::Paid => Color::Green,
        };

        let cells = vec![
            Cell::from(bill.billing_period.clone()),
            Cell::from(bill.id.clone()),
            Cell::from(bill.formatted_amount()),
            Cell::from(format!("{} kWh", bill.usage_kwh)),
            Cell::from(bill.due_date.to_string()),
            Cell::from(bill.status_label()).style(Style::default().fg(color)),
            Cell::from(bill.paid_on.map(|d| d.to_string()).unwrap_or_default())
                .style(Style::default().fg(Color::Green)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(15),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Bill History "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, state);
}

// ============================================================================
// LOGIN MODAL
// ============================================================================

fn render_login_modal(f: &mut Frame, area: Rect, app: &App) {
    let gate = &app.portal.gate;
    let modal = centered_rect(50, 12, area);

    let field_line = |field: GateField, value: String| {
        let focused = gate.focus == field;
        let marker = if focused { "→ " } else { "  " };
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        Line::from(vec![
            Span::styled(format!("{}{:<10} ", marker, field.label()), style),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        Line::from(""),
        field_line(GateField::Identifier, gate.identifier.clone()),
        Line::from(""),
        field_line(GateField::Secret, gate.masked_secret()),
        Line::from(""),
    ];

    match gate.error() {
        Some(message) => lines.push(Line::from(Span::styled(
            format!("  {}", message),
            Style::default().fg(Color::Red),
        ))),
        None => lines.push(Line::from("")),
    }

    let submit_style = if gate.can_submit() {
        Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(" Enter: Sign in ", submit_style),
        Span::styled("  Tab: switch field  Esc: close", Style::default().fg(Color::DarkGray)),
    ]));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Sign in to your account "),
    );

    f.render_widget(Clear, modal);
    f.render_widget(paragraph, modal);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);
    let mut spans = Vec::new();

    if let Some(notice) = &app.notice {
        spans.push(Span::styled(format!(" {} ", notice), Style::default().fg(Color::Green)));
        spans.push(Span::raw(" | "));
    }

    if app.portal.session.is_login_prompt_visible() {
        spans.push(Span::styled("Enter", key));
        spans.push(Span::raw(" Sign in | "));
        spans.push(Span::styled("Tab", key));
        spans.push(Span::raw(" Field | "));
        spans.push(Span::styled("Esc", key));
        spans.push(Span::raw(" Close"));
    } else {
        match app.portal.current_route() {
            Route::Landing => {
                spans.push(Span::styled("l", key));
                spans.push(Span::raw(format!(" {} | ", app.portal.session.nav_item().label())));
                spans.push(Span::styled("d", key));
                spans.push(Span::raw(" Dashboard | "));
            }
            Route::Billing => {
                spans.push(Span::styled("p", key));
                spans.push(Span::raw(" Pay | "));
                spans.push(Span::styled("↑/↓", key));
                spans.push(Span::raw(" History | "));
                spans.push(Span::styled("h", key));
                spans.push(Span::raw(" Home | "));
            }
        }
        spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        spans.push(Span::raw(" Quit"));
    }

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

/// Rect of `percent_x` width and `height` rows centered in `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height - height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
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

#[cfg(test)]
mod tests {
    use super::*;
    use eb_portal::{PortalConfig, INVALID_CREDENTIALS_MESSAGE};
    use ratatui::backend::TestBackend;

    fn app() -> App {
        App::new(Portal::new(PortalConfig::default()))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(code, KeyModifiers::NONE).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn login(app: &mut App, identifier: &str, secret: &str) {
        press(app, KeyCode::Char('l'));
        type_text(app, identifier);
        press(app, KeyCode::Tab);
        type_text(app, secret);
        press(app, KeyCode::Enter);
    }

    fn screen(app: &mut App) -> String {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_dashboard_key_redirects_when_logged_out() {
        let mut app = app();
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.portal.current_route(), Route::Landing);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_enter_blocked_until_fields_filled() {
        let mut app = app();
        press(&mut app, KeyCode::Char('l'));
        type_text(&mut app, "123123123");
        press(&mut app, KeyCode::Enter);

        assert!(app.portal.session.is_login_prompt_visible());
        assert_eq!(app.portal.gate.error(), None);
    }

    #[test]
    fn test_wrong_login_shows_error_in_modal() {
        let mut app = app();
        login(&mut app, "123123123", "nope");

        assert!(app.portal.session.is_login_prompt_visible());
        assert_eq!(app.portal.gate.error(), Some(INVALID_CREDENTIALS_MESSAGE));
        assert!(screen(&mut app).contains(INVALID_CREDENTIALS_MESSAGE));
    }

    #[test]
    fn test_typing_q_in_modal_does_not_quit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('l'));
        type_text(&mut app, "q");

        assert!(!app.should_quit);
        assert_eq!(app.portal.gate.identifier, "q");

        press(&mut app, KeyCode::Esc);
        assert!(!app.portal.session.is_login_prompt_visible());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_login_and_pay_flow() {
        let mut app = app();
        login(&mut app, "123123123", "admin");

        assert_eq!(app.portal.current_route(), Route::Billing);
        assert_eq!(app.history_state.selected(), Some(0));
        assert!(screen(&mut app).contains("Pay Now"));

        press(&mut app, KeyCode::Char('p'));
        assert!(app.portal.billing().unwrap().is_processing());
        assert!(screen(&mut app).contains("Processing Payment..."));

        // a second press while processing changes nothing
        let ticket = app.portal.billing().unwrap().in_flight().cloned();
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.portal.billing().unwrap().in_flight().cloned(), ticket);

        app.tick(Instant::now() + Duration::from_secs(3));
        let billing = app.portal.billing().unwrap();
        assert!(billing.current_pending_bill().is_none());
        assert!(app.notice.as_deref().unwrap_or_default().contains("EB2024031001"));
        assert!(!screen(&mut app).contains("Current Bill"));
    }

    #[test]
    fn test_landing_renders_brand_and_tips() {
        let mut app = app();
        let text = screen(&mut app);
        assert!(text.contains("Tamil Nadu Electricity Board"));
        assert!(text.contains("Energy Saving Tips"));
        assert!(text.contains("Login"));
    }

    #[test]
    fn test_nav_hint_only_where_l_is_bound() {
        let mut app = app();
        login(&mut app, "123123123", "admin");
        assert_eq!(app.portal.current_route(), Route::Billing);
        assert!(!screen(&mut app).contains("[l]"));

        // 'l' on the dashboard changes nothing
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.portal.current_route(), Route::Billing);
        assert!(!app.portal.session.is_login_prompt_visible());

        press(&mut app, KeyCode::Char('h'));
        assert!(screen(&mut app).contains("[l] Dashboard"));
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.portal.current_route(), Route::Billing);
    }

    #[test]
    fn test_history_selection_wraps() {
        let mut app = app();
        login(&mut app, "123123123", "admin");

        press(&mut app, KeyCode::Up);
        assert_eq!(app.history_state.selected(), Some(2));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.history_state.selected(), Some(0));
    }
}

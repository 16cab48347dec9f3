use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::fmt::money;
use crate::reports::{
    self, ExpenseRow, MonthlyCashRow, PartnerHistory, PartnerTotal, Payment, FISCAL_YEARS,
};
use crate::settings::get_store_path;
use crate::tui::{
    date_line_chart, grouped_bar_chart, horizontal_bar_chart, vertical_bar_chart, wrap_text,
    BLUE_RAMP, EXPENSE_STYLE, FOOTER_STYLE, HEADER_STYLE, INCOME_STYLE, NOTICE_STYLE, RED_RAMP,
    SELECTED_STYLE, TIMELINE_STYLE,
};

const TITLE: &str = "QuimQuinAgro \u{2014} financial overview 2025";

const MENU_ITEMS: &[&str] = &[
    "Monthly cash flow",
    "Top 10 expenses",
    "Receivables by partner \u{2014} 2025",
    "Receivables by partner \u{2014} 2024",
    "Receivables by partner \u{2014} 2023",
];

/// Menu indices 2..5 map onto FISCAL_YEARS in the same order.
const FIRST_RECEIVABLES_IDX: usize = 2;

const CASH_NARRATIVE: &str = "Income peaks in the opening months of the year and falls away \
through the second half, while expenses stay comparatively level with isolated spikes. Each \
month below pairs the journal's credits against its debits so the drift in cash flow is \
visible at a glance.";

const EXPENSES_NARRATIVE: &str = "Outflows concentrate in a handful of concepts. The ranking \
sums every debit recorded inside the selected range and keeps the ten largest, which is \
usually enough to account for most of the year's spending.";

fn receivables_narrative(year: i32) -> &'static str {
    match year {
        2025 => {
            "Collections recorded against receivables during 2025, read with the 2024 partner \
             roster. Pick a single partner to follow their payments through the year, or view \
             the concentration across the whole roster."
        }
        2024 => {
            "Collections recorded during 2024. Activity concentrates in very few partners; \
             most of the roster shows no movement for this year."
        }
        _ => {
            "The 2023 books predate the receivables ledger, so this section may have nothing \
             to show. When the table is absent no query is attempted against it."
        }
    }
}

// ---------------------------------------------------------------------------
// Section state
// ---------------------------------------------------------------------------

enum Section {
    MonthlyCash {
        rows: Vec<MonthlyCashRow>,
    },
    TopExpenses {
        from: String,
        to: String,
        rows: Vec<ExpenseRow>,
    },
    Receivables {
        year: i32,
        state: ReceivablesState,
    },
}

enum ReceivablesState {
    Unavailable {
        table: &'static str,
    },
    Loaded {
        options: Vec<String>,
        selected: usize,
        data: ReceivablesData,
    },
}

enum ReceivablesData {
    All(Vec<PartnerTotal>),
    Single {
        name: String,
        payments: Vec<Payment>,
    },
    CodeNotFound {
        name: String,
    },
}

#[derive(Clone, Copy, PartialEq)]
enum DateField {
    From,
    To,
}

enum Overlay {
    None,
    PartnerPicker { selection: usize },
    DateEditor { field: DateField, from: String, to: String },
}

/// Rebuild the active section from scratch. Selection changes, filter
/// changes and refresh all come through here; the shared query cache is the
/// only state that survives.
fn build_section(
    exec: &mut QueryExecutor,
    menu_idx: usize,
    partner: Option<&str>,
    range: Option<(&str, &str)>,
) -> Section {
    match menu_idx {
        0 => Section::MonthlyCash {
            rows: reports::monthly_cash(exec),
        },
        1 => {
            let (from, to) = match range {
                Some((f, t)) => (f.to_string(), t.to_string()),
                None => (
                    reports::FISCAL_YEAR_START.to_string(),
                    reports::FISCAL_YEAR_END.to_string(),
                ),
            };
            let rows = reports::top_expenses(exec, &from, &to);
            Section::TopExpenses { from, to, rows }
        }
        _ => build_receivables(exec, menu_idx - FIRST_RECEIVABLES_IDX, partner),
    }
}

fn build_receivables(
    exec: &mut QueryExecutor,
    year_idx: usize,
    partner: Option<&str>,
) -> Section {
    let schema = &FISCAL_YEARS[year_idx.min(FISCAL_YEARS.len() - 1)];
    if !reports::receivables_available(exec, schema) {
        return Section::Receivables {
            year: schema.year,
            state: ReceivablesState::Unavailable {
                table: schema.receivables_table,
            },
        };
    }

    let roster = reports::partners(exec, schema);
    let options = reports::partner_options(&roster);

    let state = match partner {
        Some(name) if name != reports::ALL_PARTNERS => {
            let selected = options.iter().position(|o| o == name).unwrap_or(0);
            let data = match reports::partner_history(exec, schema, &roster, name) {
                PartnerHistory::CodeNotFound => ReceivablesData::CodeNotFound {
                    name: name.to_string(),
                },
                PartnerHistory::Payments(payments) => ReceivablesData::Single {
                    name: name.to_string(),
                    payments,
                },
            };
            ReceivablesState::Loaded {
                options,
                selected,
                data,
            }
        }
        _ => ReceivablesState::Loaded {
            data: ReceivablesData::All(reports::receivables_by_partner(exec, schema)),
            options,
            selected: 0,
        },
    };

    Section::Receivables {
        year: schema.year,
        state,
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

struct Dashboard {
    exec: QueryExecutor,
    menu_selection: usize,
    section: Section,
    overlay: Overlay,
    status_message: Option<String>,
    scroll: usize,
}

impl Dashboard {
    fn new(mut exec: QueryExecutor) -> Self {
        let section = build_section(&mut exec, 0, None, None);
        let status_message = exec.take_error();
        Self {
            exec,
            menu_selection: 0,
            section,
            overlay: Overlay::None,
            status_message,
            scroll: 0,
        }
    }

    fn rebuild(&mut self, partner: Option<&str>, range: Option<(&str, &str)>) {
        self.section = build_section(&mut self.exec, self.menu_selection, partner, range);
        self.scroll = 0;
        self.status_message = self.exec.take_error();
    }

    /// Re-run the active handler with its current filters.
    fn refresh(&mut self) {
        match &self.section {
            Section::MonthlyCash { .. } => self.rebuild(None, None),
            Section::TopExpenses { from, to, .. } => {
                let (f, t) = (from.clone(), to.clone());
                self.rebuild(None, Some((&f, &t)));
            }
            Section::Receivables { state, .. } => {
                let partner = match state {
                    ReceivablesState::Loaded {
                        options, selected, ..
                    } => options.get(*selected).cloned(),
                    ReceivablesState::Unavailable { .. } => None,
                };
                self.rebuild(partner.as_deref(), None);
            }
        }
    }

    fn partner_options_snapshot(&self) -> Vec<String> {
        if let Section::Receivables {
            state: ReceivablesState::Loaded { options, .. },
            ..
        } = &self.section
        {
            options.clone()
        } else {
            Vec::new()
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Returns true when the dashboard should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match std::mem::replace(&mut self.overlay, Overlay::None) {
            Overlay::PartnerPicker { mut selection } => {
                let options = self.partner_options_snapshot();
                match code {
                    KeyCode::Esc => {}
                    KeyCode::Enter => {
                        if let Some(name) = options.get(selection) {
                            let name = name.clone();
                            self.rebuild(Some(&name), None);
                        }
                    }
                    KeyCode::Up => {
                        selection = selection.saturating_sub(1);
                        self.overlay = Overlay::PartnerPicker { selection };
                    }
                    KeyCode::Down => {
                        selection = (selection + 1).min(options.len().saturating_sub(1));
                        self.overlay = Overlay::PartnerPicker { selection };
                    }
                    _ => self.overlay = Overlay::PartnerPicker { selection },
                }
                false
            }
            Overlay::DateEditor {
                mut field,
                mut from,
                mut to,
            } => {
                match code {
                    KeyCode::Esc => {}
                    KeyCode::Enter => {
                        let (f, t) = (from.clone(), to.clone());
                        self.rebuild(None, Some((&f, &t)));
                    }
                    KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
                        field = match field {
                            DateField::From => DateField::To,
                            DateField::To => DateField::From,
                        };
                        self.overlay = Overlay::DateEditor { field, from, to };
                    }
                    KeyCode::Backspace => {
                        match field {
                            DateField::From => from.pop(),
                            DateField::To => to.pop(),
                        };
                        self.overlay = Overlay::DateEditor { field, from, to };
                    }
                    KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                        match field {
                            DateField::From => from.push(c),
                            DateField::To => to.push(c),
                        }
                        self.overlay = Overlay::DateEditor { field, from, to };
                    }
                    _ => self.overlay = Overlay::DateEditor { field, from, to },
                }
                false
            }
            Overlay::None => self.handle_main_key(code),
        }
    }

    fn handle_main_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                self.menu_selection = self.menu_selection.saturating_sub(1);
                self.rebuild(None, None);
            }
            KeyCode::Down => {
                self.menu_selection = (self.menu_selection + 1).min(MENU_ITEMS.len() - 1);
                self.rebuild(None, None);
            }
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('e') => {
                if let Section::TopExpenses { from, to, .. } = &self.section {
                    self.overlay = Overlay::DateEditor {
                        field: DateField::From,
                        from: from.clone(),
                        to: to.clone(),
                    };
                }
            }
            KeyCode::Char('p') => {
                if let Section::Receivables {
                    state: ReceivablesState::Loaded { selected, .. },
                    ..
                } = &self.section
                {
                    self.overlay = Overlay::PartnerPicker {
                        selection: *selected,
                    };
                }
            }
            KeyCode::Char('j') => self.scroll += 1,
            KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll += 10,
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            _ => {}
        }
        false
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw(&mut self, frame: &mut Frame) {
        match &self.overlay {
            Overlay::PartnerPicker { selection } => {
                let selection = *selection;
                let options = self.partner_options_snapshot();
                self.draw_picker(frame, &options, selection);
                return;
            }
            Overlay::DateEditor { field, from, to } => {
                let (field, from, to) = (*field, from.clone(), to.clone());
                self.draw_date_editor(frame, field, &from, &to);
                return;
            }
            Overlay::None => {}
        }

        let area = frame.area();
        let [header_area, sep_area, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {TITLE}")).style(HEADER_STYLE),
            header_area,
        );
        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        let [sidebar_area, content_area] =
            Layout::horizontal([Constraint::Length(32), Constraint::Fill(1)]).areas(body_area);

        self.draw_sidebar(frame, sidebar_area);
        self.draw_content(frame, content_area);

        if let Some(msg) = &self.status_message {
            frame.render_widget(
                Paragraph::new(format!(" {msg}")).style(NOTICE_STYLE),
                hints_area,
            );
        } else {
            frame.render_widget(
                Paragraph::new(
                    " \u{2191}/\u{2193}=section  j/k=scroll  e=dates  p=partner  r=refresh  q=quit",
                )
                .style(FOOTER_STYLE),
                hints_area,
            );
        }
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from(Span::styled(
                " Sections",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (i, item) in MENU_ITEMS.iter().enumerate() {
            let marker = if i == self.menu_selection { ">" } else { " " };
            let style = if i == self.menu_selection {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(format!(" {marker} {item}"), style)));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" store queries: {}", self.exec.store_round_trips()),
            FOOTER_STYLE,
        )));
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn section_row_count(&self) -> usize {
        match &self.section {
            Section::MonthlyCash { rows } => rows.len(),
            Section::TopExpenses { rows, .. } => rows.len(),
            Section::Receivables { state, .. } => match state {
                ReceivablesState::Loaded { data, .. } => match data {
                    ReceivablesData::All(totals) => totals.len(),
                    ReceivablesData::Single { payments, .. } => payments.len(),
                    ReceivablesData::CodeNotFound { .. } => 0,
                },
                ReceivablesState::Unavailable { .. } => 0,
            },
        }
    }

    fn draw_content(&mut self, frame: &mut Frame, area: Rect) {
        self.scroll = self.scroll.min(self.section_row_count().saturating_sub(1));
        let narrative = match &self.section {
            Section::MonthlyCash { .. } => CASH_NARRATIVE,
            Section::TopExpenses { .. } => EXPENSES_NARRATIVE,
            Section::Receivables { year, .. } => receivables_narrative(*year),
        };
        let width = area.width.saturating_sub(2) as usize;
        let (wrapped, narrative_lines) = wrap_text(narrative, width.max(20));

        let [narrative_area, filter_area, table_area, chart_area] = Layout::vertical([
            Constraint::Length(narrative_lines + 1),
            Constraint::Length(1),
            Constraint::Fill(2),
            Constraint::Fill(3),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new(wrapped).style(FOOTER_STYLE), narrative_area);

        match &self.section {
            Section::MonthlyCash { rows } => {
                frame.render_widget(Paragraph::new(""), filter_area);
                if rows.is_empty() {
                    self.draw_no_data(frame, table_area, "No cash movements recorded.");
                    return;
                }
                let header = Row::new(["Month", "Income", "Expense"])
                    .style(FOOTER_STYLE)
                    .bottom_margin(1);
                let body: Vec<Row> = rows
                    .iter()
                    .map(|r| {
                        Row::new([
                            Cell::from(r.month.clone()),
                            Cell::from(money(r.total_income)),
                            Cell::from(money(r.total_expense)),
                        ])
                    })
                    .collect();
                let widths = vec![
                    Constraint::Length(10),
                    Constraint::Length(16),
                    Constraint::Length(16),
                ];
                render_scrolled_table(frame, table_area, header, body, widths, self.scroll);

                let labels: Vec<String> = rows.iter().map(|r| month_label(&r.month)).collect();
                let income: Vec<u64> = rows.iter().map(|r| r.total_income.max(0.0) as u64).collect();
                let expense: Vec<u64> =
                    rows.iter().map(|r| r.total_expense.max(0.0) as u64).collect();
                grouped_bar_chart(
                    frame,
                    chart_area,
                    "Monthly income vs expense",
                    &labels,
                    (&income, INCOME_STYLE),
                    (&expense, EXPENSE_STYLE),
                );
            }
            Section::TopExpenses { from, to, rows } => {
                frame.render_widget(
                    Paragraph::new(format!(
                        " Range: {from} \u{2192} {to}   (e to edit)"
                    ))
                    .style(FOOTER_STYLE),
                    filter_area,
                );
                if rows.is_empty() {
                    self.draw_no_data(frame, table_area, "No expenses found in the selected range.");
                    return;
                }
                let header = Row::new(["Concept", "Total"])
                    .style(FOOTER_STYLE)
                    .bottom_margin(1);
                let body: Vec<Row> = rows
                    .iter()
                    .map(|r| Row::new([Cell::from(r.concept.clone()), Cell::from(money(r.total))]))
                    .collect();
                let widths = vec![Constraint::Fill(1), Constraint::Length(16)];
                render_scrolled_table(frame, table_area, header, body, widths, self.scroll);

                let bars: Vec<(String, f64)> =
                    rows.iter().map(|r| (r.concept.clone(), r.total)).collect();
                horizontal_bar_chart(frame, chart_area, "Largest expenses", &bars, RED_RAMP);
            }
            Section::Receivables { year, state } => match state {
                ReceivablesState::Unavailable { table } => {
                    frame.render_widget(Paragraph::new(""), filter_area);
                    self.draw_no_data(
                        frame,
                        table_area,
                        &format!(
                            "Receivables are not available for {year}: table `{table}` is \
                             missing from the store."
                        ),
                    );
                }
                ReceivablesState::Loaded {
                    options,
                    selected,
                    data,
                } => {
                    let current = options
                        .get(*selected)
                        .map(String::as_str)
                        .unwrap_or(reports::ALL_PARTNERS);
                    frame.render_widget(
                        Paragraph::new(format!(" Partner: {current}   (p to select)"))
                            .style(FOOTER_STYLE),
                        filter_area,
                    );
                    match data {
                        ReceivablesData::All(totals) => {
                            if totals.is_empty() {
                                self.draw_no_data(
                                    frame,
                                    table_area,
                                    &format!("No collections recorded for {year}."),
                                );
                                return;
                            }
                            let header = Row::new(["Partner", "Total collected"])
                                .style(FOOTER_STYLE)
                                .bottom_margin(1);
                            let body: Vec<Row> = totals
                                .iter()
                                .map(|t| {
                                    Row::new([
                                        Cell::from(t.partner.clone()),
                                        Cell::from(money(t.total)),
                                    ])
                                })
                                .collect();
                            let widths = vec![Constraint::Fill(1), Constraint::Length(16)];
                            render_scrolled_table(frame, table_area, header, body, widths, self.scroll);

                            let bars: Vec<(String, f64)> = totals
                                .iter()
                                .map(|t| (t.partner.clone(), t.total))
                                .collect();
                            vertical_bar_chart(
                                frame,
                                chart_area,
                                "Collections by partner",
                                &bars,
                                BLUE_RAMP,
                            );
                        }
                        ReceivablesData::Single { name, payments } => {
                            if payments.is_empty() {
                                self.draw_no_data(
                                    frame,
                                    table_area,
                                    &format!("No collections recorded for {name} in {year}."),
                                );
                                return;
                            }
                            let header = Row::new(["Date", "Amount"])
                                .style(FOOTER_STYLE)
                                .bottom_margin(1);
                            let body: Vec<Row> = payments
                                .iter()
                                .map(|p| {
                                    Row::new([
                                        Cell::from(p.date.clone()),
                                        Cell::from(money(p.amount)),
                                    ])
                                })
                                .collect();
                            let widths = vec![Constraint::Length(12), Constraint::Length(16)];
                            render_scrolled_table(frame, table_area, header, body, widths, self.scroll);

                            let points: Vec<(chrono::NaiveDate, f64)> = payments
                                .iter()
                                .filter_map(|p| p.parsed.map(|d| (d, p.amount)))
                                .collect();
                            if points.is_empty() {
                                self.draw_no_data(frame, chart_area, "Payment dates could not be parsed.");
                            } else {
                                date_line_chart(
                                    frame,
                                    chart_area,
                                    "Payments over time",
                                    &points,
                                    TIMELINE_STYLE,
                                );
                            }
                        }
                        ReceivablesData::CodeNotFound { name } => {
                            self.draw_no_data(
                                frame,
                                table_area,
                                &format!("No code found for partner '{name}' in the roster."),
                            );
                        }
                    }
                }
            },
        }
    }

    fn draw_no_data(&self, frame: &mut Frame, area: Rect, message: &str) {
        frame.render_widget(
            Paragraph::new(format!(" {message}")).style(NOTICE_STYLE),
            area,
        );
    }

    fn draw_picker(&self, frame: &mut Frame, options: &[String], selection: usize) {
        let area = frame.area();
        let [header_area, sep_area, content_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {TITLE}")).style(HEADER_STYLE),
            header_area,
        );
        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                " Select a partner",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        let visible = content_area.height.saturating_sub(3) as usize;
        let first = selection.saturating_sub(visible.saturating_sub(1));
        for (i, option) in options.iter().enumerate().skip(first).take(visible.max(1)) {
            let marker = if i == selection { ">" } else { " " };
            let style = if i == selection {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(format!(" {marker} {option}"), style)));
        }
        frame.render_widget(Paragraph::new(lines), content_area);

        frame.render_widget(
            Paragraph::new(" \u{2191}/\u{2193}=navigate  Enter=select  Esc=back").style(FOOTER_STYLE),
            hints_area,
        );
    }

    fn draw_date_editor(&self, frame: &mut Frame, field: DateField, from: &str, to: &str) {
        let area = frame.area();
        let [header_area, sep_area, content_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {TITLE}")).style(HEADER_STYLE),
            header_area,
        );
        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        let field_line = |label: &str, value: &str, active: bool| {
            let style = if active {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            let cursor = if active { "_" } else { "" };
            Line::from(Span::styled(format!(" {label} {value}{cursor}"), style))
        };

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                " Edit date range (YYYY-MM-DD)",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            field_line("From:", from, field == DateField::From),
            field_line("To:  ", to, field == DateField::To),
        ];
        frame.render_widget(Paragraph::new(lines), content_area);

        frame.render_widget(
            Paragraph::new(" Enter=apply  Tab=switch field  Esc=cancel").style(FOOTER_STYLE),
            hints_area,
        );
    }
}

fn render_scrolled_table(
    frame: &mut Frame,
    area: Rect,
    header: Row<'static>,
    rows: Vec<Row<'static>>,
    widths: Vec<Constraint>,
    scroll: usize,
) {
    let visible = (area.height.saturating_sub(2) as usize).max(1);
    let body: Vec<Row> = rows.into_iter().skip(scroll).take(visible).collect();
    let table = Table::new(body, widths).header(header).column_spacing(2);
    frame.render_widget(table, area);
}

/// "2025-01" → "Jan"; unknown suffixes fall back to the raw value.
fn month_label(month: &str) -> String {
    let parts: Vec<&str> = month.split('-').collect();
    if parts.len() == 2 {
        match parts[1] {
            "01" => "Jan",
            "02" => "Feb",
            "03" => "Mar",
            "04" => "Apr",
            "05" => "May",
            "06" => "Jun",
            "07" => "Jul",
            "08" => "Aug",
            "09" => "Sep",
            "10" => "Oct",
            "11" => "Nov",
            "12" => "Dec",
            _ => month,
        }
        .to_string()
    } else {
        month.to_string()
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run() -> Result<()> {
    let exec = QueryExecutor::new(&get_store_path());
    let mut dashboard = Dashboard::new(exec);

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| dashboard.draw(frame)) {
            break Err(e.into());
        }
        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                if dashboard.handle_key(key.code) {
                    break Ok(());
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::path::PathBuf;

    fn seeded_store() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contabilidad.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE caja2025 (fecha TEXT, abono REAL, prestamo REAL, detalle TEXT);
             CREATE TABLE socios2024 (nombre TEXT, codigo TEXT);
             CREATE TABLE socios2023 (nombre TEXT, codigo TEXT);
             CREATE TABLE cxc2025 (fecha TEXT, codigo_cliente TEXT, salida TEXT);
             CREATE TABLE cxc2024 (fecha TEXT, socio TEXT, salida TEXT);
             INSERT INTO caja2025 VALUES ('2025-01-10', 100.0, 20.0, 'seed');
             INSERT INTO socios2024 VALUES ('Yamile Vera', 'S01');
             INSERT INTO cxc2025 VALUES ('2025-02-01', 'S01', '1500');",
        )
        .unwrap();
        (dir, path)
    }

    #[test]
    fn test_initial_section_is_monthly_cash() {
        let (_dir, path) = seeded_store();
        let dashboard = Dashboard::new(QueryExecutor::new(&path));
        assert!(matches!(
            dashboard.section,
            Section::MonthlyCash { ref rows } if rows.len() == 1
        ));
        assert!(dashboard.status_message.is_none());
    }

    #[test]
    fn test_menu_down_dispatches_to_expenses_with_defaults() {
        let (_dir, path) = seeded_store();
        let mut dashboard = Dashboard::new(QueryExecutor::new(&path));
        dashboard.handle_key(KeyCode::Down);
        match &dashboard.section {
            Section::TopExpenses { from, to, rows } => {
                assert_eq!(from, reports::FISCAL_YEAR_START);
                assert_eq!(to, reports::FISCAL_YEAR_END);
                assert_eq!(rows.len(), 1);
            }
            _ => panic!("expected the expenses section"),
        }
    }

    #[test]
    fn test_receivables_2023_missing_table_is_unavailable() {
        let (_dir, path) = seeded_store();
        let mut dashboard = Dashboard::new(QueryExecutor::new(&path));
        dashboard.menu_selection = 4;
        dashboard.rebuild(None, None);
        match &dashboard.section {
            Section::Receivables { year, state } => {
                assert_eq!(*year, 2023);
                assert!(matches!(
                    state,
                    ReceivablesState::Unavailable { table: "cxc2023" }
                ));
            }
            _ => panic!("expected the receivables section"),
        }
        assert!(dashboard.status_message.is_none());
    }

    #[test]
    fn test_partner_selection_rebuilds_single_view() {
        let (_dir, path) = seeded_store();
        let mut dashboard = Dashboard::new(QueryExecutor::new(&path));
        dashboard.menu_selection = 2;
        dashboard.rebuild(Some("Yamile Vera"), None);
        match &dashboard.section {
            Section::Receivables { year: 2025, state } => match state {
                ReceivablesState::Loaded { data, selected, .. } => {
                    assert_eq!(*selected, 1);
                    match data {
                        ReceivablesData::Single { name, payments } => {
                            assert_eq!(name, "Yamile Vera");
                            assert_eq!(payments.len(), 1);
                        }
                        _ => panic!("expected the single-partner view"),
                    }
                }
                _ => panic!("expected a loaded roster"),
            },
            _ => panic!("expected the 2025 receivables section"),
        }
    }

    #[test]
    fn test_unknown_partner_takes_warning_path() {
        let (_dir, path) = seeded_store();
        let mut dashboard = Dashboard::new(QueryExecutor::new(&path));
        dashboard.menu_selection = 2;
        dashboard.rebuild(Some("Nobody At All"), None);
        match &dashboard.section {
            Section::Receivables { state, .. } => match state {
                ReceivablesState::Loaded { data, .. } => {
                    assert!(matches!(data, ReceivablesData::CodeNotFound { .. }));
                }
                _ => panic!("expected a loaded roster"),
            },
            _ => panic!("expected the receivables section"),
        }
    }

    #[test]
    fn test_reselecting_section_only_hits_cache() {
        let (_dir, path) = seeded_store();
        let mut dashboard = Dashboard::new(QueryExecutor::new(&path));
        let trips = dashboard.exec.store_round_trips();
        dashboard.refresh();
        dashboard.refresh();
        assert_eq!(dashboard.exec.store_round_trips(), trips);
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label("2025-01"), "Jan");
        assert_eq!(month_label("2025-12"), "Dec");
        assert_eq!(month_label("garbage"), "garbage");
    }
}

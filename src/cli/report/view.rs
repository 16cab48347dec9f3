use ratatui::{
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::Span,
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crossterm::event::KeyCode;

use crate::cli::ReportCommands;
use crate::error::{AgroError, Result};
use crate::executor::QueryExecutor;
use crate::fmt::money;
use crate::reports::{self, PartnerHistory};
use crate::settings::get_store_path;
use crate::tui::{ReportView, ReportViewAction, FOOTER_STYLE, HEADER_STYLE, NOTICE_STYLE};

const BOLD: Style = Style::new().add_modifier(Modifier::BOLD);
const HEADER_ROW_STYLE: Style = Style::new()
    .fg(ratatui::style::Color::DarkGray)
    .add_modifier(Modifier::BOLD);

/// Build a scrollable table view for a report command.
pub(crate) fn build_view(cmd: &ReportCommands) -> Result<Box<dyn ReportView>> {
    match cmd {
        ReportCommands::Cash => build_cash(),
        ReportCommands::Expenses { from_date, to_date } => {
            build_expenses(from_date.clone(), to_date.clone())
        }
        ReportCommands::Receivables { year, partner } => {
            build_receivables(*year, partner.clone())
        }
    }
}

// ---------------------------------------------------------------------------
// Table-based report view (shared by all report types)
// ---------------------------------------------------------------------------

pub(crate) struct TableReportView {
    title: String,
    notice: Option<String>,
    header: Row<'static>,
    rows: Vec<Row<'static>>,
    widths: Vec<Constraint>,
    offset: usize,
    visible_count: usize,
}

impl TableReportView {
    fn new(
        title: impl Into<String>,
        header: Row<'static>,
        rows: Vec<Row<'static>>,
        widths: Vec<Constraint>,
    ) -> Self {
        Self {
            title: title.into(),
            notice: None,
            header,
            rows,
            widths,
            offset: 0,
            visible_count: 20,
        }
    }

    fn with_notice(mut self, notice: Option<String>) -> Self {
        self.notice = notice;
        self
    }
}

impl ReportView for TableReportView {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep_area, notice_area, content_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(if self.notice.is_some() { 1 } else { 0 }),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {}", self.title)).style(HEADER_STYLE),
            header_area,
        );

        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        if let Some(notice) = &self.notice {
            frame.render_widget(
                Paragraph::new(format!(" {notice}")).style(NOTICE_STYLE),
                notice_area,
            );
        }

        let header_overhead = 2u16;
        let visible = content_area.height.saturating_sub(header_overhead) as usize;
        self.visible_count = visible.max(1);

        let visible_rows: Vec<Row> = self
            .rows
            .iter()
            .skip(self.offset)
            .take(visible)
            .cloned()
            .collect();

        let table = Table::new(visible_rows, self.widths.clone())
            .header(self.header.clone())
            .column_spacing(2);
        frame.render_widget(table, content_area);

        let max = self.rows.len().saturating_sub(visible);
        let pos_info = if max > 0 {
            format!("  line {}/{}", self.offset + 1, self.rows.len())
        } else {
            String::new()
        };
        frame.render_widget(
            Paragraph::new(format!(
                " \u{2191}/\u{2193}=scroll  q/Esc=close{pos_info}"
            ))
            .style(FOOTER_STYLE),
            footer_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction {
        let page = self.visible_count;
        let max = self.rows.len().saturating_sub(page);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => ReportViewAction::Close,
            KeyCode::Up | KeyCode::Char('k') => {
                self.offset = self.offset.saturating_sub(1);
                ReportViewAction::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.offset = (self.offset + 1).min(max);
                ReportViewAction::Continue
            }
            KeyCode::PageUp => {
                self.offset = self.offset.saturating_sub(page);
                ReportViewAction::Continue
            }
            KeyCode::PageDown => {
                self.offset = (self.offset + page).min(max);
                ReportViewAction::Continue
            }
            KeyCode::Home => {
                self.offset = 0;
                ReportViewAction::Continue
            }
            KeyCode::End => {
                self.offset = max;
                ReportViewAction::Continue
            }
            _ => ReportViewAction::Continue,
        }
    }
}

fn money_cell(amount: f64) -> Cell<'static> {
    Cell::from(money(amount))
}

fn text_cell(s: impl Into<String>) -> Cell<'static> {
    Cell::from(s.into())
}

fn bold_cell(s: impl Into<String>) -> Cell<'static> {
    Cell::from(Span::styled(s.into(), BOLD))
}

fn empty_notice_rows(message: &str, num_cols: usize) -> Vec<Row<'static>> {
    let mut cells = vec![text_cell(message)];
    for _ in 1..num_cols {
        cells.push(Cell::from(""));
    }
    vec![Row::new(cells)]
}

// ---------------------------------------------------------------------------
// Report builders
// ---------------------------------------------------------------------------

fn build_cash() -> Result<Box<dyn ReportView>> {
    let mut exec = QueryExecutor::new(&get_store_path());
    let data = reports::monthly_cash(&mut exec);
    let notice = exec.take_error();

    let widths = vec![
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Length(16),
    ];
    let header = Row::new(["Month", "Income", "Expense"])
        .style(HEADER_ROW_STYLE)
        .bottom_margin(1);

    let rows = if data.is_empty() {
        empty_notice_rows("No cash movements recorded.", 3)
    } else {
        let mut rows: Vec<Row> = data
            .iter()
            .map(|r| {
                Row::new([
                    text_cell(&r.month),
                    money_cell(r.total_income),
                    money_cell(r.total_expense),
                ])
            })
            .collect();
        let total_income: f64 = data.iter().map(|r| r.total_income).sum();
        let total_expense: f64 = data.iter().map(|r| r.total_expense).sum();
        rows.push(Row::new([
            bold_cell("Total"),
            money_cell(total_income),
            money_cell(total_expense),
        ]));
        rows
    };

    Ok(Box::new(
        TableReportView::new("Monthly Cash Flow", header, rows, widths).with_notice(notice),
    ))
}

fn build_expenses(
    from_date: Option<String>,
    to_date: Option<String>,
) -> Result<Box<dyn ReportView>> {
    let from = from_date.unwrap_or_else(|| reports::FISCAL_YEAR_START.to_string());
    let to = to_date.unwrap_or_else(|| reports::FISCAL_YEAR_END.to_string());
    let mut exec = QueryExecutor::new(&get_store_path());
    let data = reports::top_expenses(&mut exec, &from, &to);
    let notice = exec.take_error();

    let widths = vec![Constraint::Fill(1), Constraint::Length(16)];
    let header = Row::new(["Concept", "Total"])
        .style(HEADER_ROW_STYLE)
        .bottom_margin(1);

    let rows = if data.is_empty() {
        empty_notice_rows("No expenses found in the selected range.", 2)
    } else {
        data.iter()
            .map(|r| Row::new([text_cell(&r.concept), money_cell(r.total)]))
            .collect()
    };

    Ok(Box::new(
        TableReportView::new(
            format!("Top 10 Expenses \u{2014} {from} to {to}"),
            header,
            rows,
            widths,
        )
        .with_notice(notice),
    ))
}

fn build_receivables(year: i32, partner: Option<String>) -> Result<Box<dyn ReportView>> {
    let schema = reports::year_schema(year)
        .ok_or_else(|| AgroError::Other(format!("Unknown fiscal year: {year}")))?;
    let mut exec = QueryExecutor::new(&get_store_path());

    let widths = vec![Constraint::Fill(1), Constraint::Length(16)];

    if !reports::receivables_available(&mut exec, schema) {
        let header = Row::new(["Partner", "Total collected"])
            .style(HEADER_ROW_STYLE)
            .bottom_margin(1);
        let rows = empty_notice_rows("Not available for this year.", 2);
        return Ok(Box::new(
            TableReportView::new(
                format!("Receivables by Partner \u{2014} {year}"),
                header,
                rows,
                widths,
            )
            .with_notice(Some(format!(
                "Table `{}` is missing from the store.",
                schema.receivables_table
            ))),
        ));
    }

    match partner {
        None => {
            let data = reports::receivables_by_partner(&mut exec, schema);
            let notice = exec.take_error();
            let header = Row::new(["Partner", "Total collected"])
                .style(HEADER_ROW_STYLE)
                .bottom_margin(1);
            let rows = if data.is_empty() {
                empty_notice_rows("No collections recorded.", 2)
            } else {
                data.iter()
                    .map(|r| Row::new([text_cell(&r.partner), money_cell(r.total)]))
                    .collect()
            };
            Ok(Box::new(
                TableReportView::new(
                    format!("Receivables by Partner \u{2014} {year}"),
                    header,
                    rows,
                    widths,
                )
                .with_notice(notice),
            ))
        }
        Some(name) => {
            let roster = reports::partners(&mut exec, schema);
            let header = Row::new(["Date", "Amount"])
                .style(HEADER_ROW_STYLE)
                .bottom_margin(1);
            let (rows, notice) = match reports::partner_history(&mut exec, schema, &roster, &name)
            {
                PartnerHistory::CodeNotFound => (
                    empty_notice_rows("Partner not found in the roster.", 2),
                    Some(format!(
                        "No code found for partner '{name}' in `{}`.",
                        schema.partner_table
                    )),
                ),
                PartnerHistory::Payments(data) => {
                    let notice = exec.take_error();
                    let rows = if data.is_empty() {
                        empty_notice_rows("No collections recorded for this partner.", 2)
                    } else {
                        let mut rows: Vec<Row> = data
                            .iter()
                            .map(|p| Row::new([text_cell(&p.date), money_cell(p.amount)]))
                            .collect();
                        let total: f64 = data.iter().map(|p| p.amount).sum();
                        rows.push(Row::new([bold_cell("Total"), money_cell(total)]));
                        rows
                    };
                    (rows, notice)
                }
            };
            Ok(Box::new(
                TableReportView::new(
                    format!("Collections from {name} \u{2014} {year}"),
                    header,
                    rows,
                    widths,
                )
                .with_notice(notice),
            ))
        }
    }
}

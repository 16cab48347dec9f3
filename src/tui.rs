use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Bar, BarChart, BarGroup, Block, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::money_whole;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Green)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const NOTICE_STYLE: Style = Style::new().fg(Color::Yellow);

// Series colors follow the association's published charts: blue income,
// amber expense, green payment timeline.
pub const INCOME_STYLE: Style = Style::new().fg(Color::Rgb(31, 119, 180));
pub const EXPENSE_STYLE: Style = Style::new().fg(Color::Rgb(255, 193, 7));
pub const TIMELINE_STYLE: Style = Style::new().fg(Color::Rgb(44, 160, 44));

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

// ---------------------------------------------------------------------------
// Report view infrastructure
// ---------------------------------------------------------------------------

pub enum ReportViewAction {
    Continue,
    Close,
}

pub trait ReportView {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction;
}

/// Run an interactive ratatui report view. Sets up the terminal, event loop,
/// and panic hook, then restores the terminal on exit.
pub fn run_report_view(view: &mut dyn ReportView) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| view.draw(frame)) {
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
                match view.handle_key(key.code) {
                    ReportViewAction::Close => break Ok(()),
                    ReportViewAction::Continue => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Chart helpers
// ---------------------------------------------------------------------------

/// Pick nice round y-axis tick values (top and mid) given a max data value.
pub fn y_axis_ticks(max_val: f64) -> (f64, f64) {
    let steps = [
        1000.0, 2500.0, 5000.0, 10000.0, 25000.0, 50000.0, 100000.0, 250000.0, 500000.0,
        1000000.0, 2500000.0, 5000000.0, 10000000.0,
    ];
    let top = steps
        .iter()
        .copied()
        .find(|&s| s >= max_val)
        .unwrap_or(max_val);
    let mid = top / 2.0;
    (top, mid)
}

/// Compact axis label: "$Xk" for thousands, "$XM" for millions.
pub fn format_axis_amount(val: f64) -> String {
    if val >= 1_000_000.0 {
        let m = val / 1_000_000.0;
        if m == m.floor() {
            format!("${}M", m as u64)
        } else {
            format!("${:.1}M", m)
        }
    } else if val >= 1000.0 {
        let k = val / 1000.0;
        if k == k.floor() {
            format!("${}k", k as u64)
        } else {
            format!("${:.1}k", k)
        }
    } else {
        format!("${}", val as u64)
    }
}

/// Two-color magnitude ramp, light at 0.0 to saturated at 1.0.
#[derive(Clone, Copy)]
pub struct ColorRamp {
    pub light: (u8, u8, u8),
    pub dark: (u8, u8, u8),
}

pub const RED_RAMP: ColorRamp = ColorRamp {
    light: (250, 195, 180),
    dark: (205, 35, 30),
};

pub const BLUE_RAMP: ColorRamp = ColorRamp {
    light: (185, 212, 245),
    dark: (25, 85, 175),
};

impl ColorRamp {
    pub fn color_at(&self, frac: f64) -> Color {
        let t = frac.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color::Rgb(
            mix(self.light.0, self.dark.0),
            mix(self.light.1, self.dark.1),
            mix(self.light.2, self.dark.2),
        )
    }
}

/// Grouped vertical bar chart: one group per category label, two bars per
/// group, with rounded y-axis tick labels down the left edge.
pub fn grouped_bar_chart(
    frame: &mut Frame,
    area: ratatui::layout::Rect,
    title: &str,
    labels: &[String],
    first: (&[u64], Style),
    second: (&[u64], Style),
) {
    let max_val = first
        .0
        .iter()
        .chain(second.0.iter())
        .copied()
        .max()
        .unwrap_or(1) as f64;

    let (top_tick, mid_tick) = y_axis_ticks(max_val);
    let top_label = format_axis_amount(top_tick);
    let mid_label = format_axis_amount(mid_tick);
    let y_label_width = top_label.len().max(mid_label.len()) as u16 + 1;

    let [y_axis_area, bar_area] = Layout::horizontal([
        Constraint::Length(y_label_width),
        Constraint::Fill(1),
    ])
    .areas(area);

    // Tick labels: top tick near the top row, mid tick at the middle.
    let inner_height = bar_area.height.saturating_sub(2);
    let mid_row = inner_height / 2;
    let mut y_lines: Vec<Line> = vec![Line::from("")];
    for row in 0..inner_height {
        if row == 0 {
            y_lines.push(Line::from(Span::styled(
                format!("{:>width$}", top_label, width = y_label_width as usize),
                FOOTER_STYLE,
            )));
        } else if row == mid_row {
            y_lines.push(Line::from(Span::styled(
                format!("{:>width$}", mid_label, width = y_label_width as usize),
                FOOTER_STYLE,
            )));
        } else {
            y_lines.push(Line::from(""));
        }
    }
    frame.render_widget(Paragraph::new(y_lines), y_axis_area);

    let groups: Vec<BarGroup> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let a = first.0.get(i).copied().unwrap_or(0);
            let b = second.0.get(i).copied().unwrap_or(0);
            let bars = vec![
                Bar::default().value(a).style(first.1),
                Bar::default().value(b).style(second.1),
            ];
            BarGroup::default()
                .label(Line::from(label.as_str()))
                .bars(&bars)
        })
        .collect();

    let block = Block::default()
        .title(title.to_string())
        .title_style(Style::default().add_modifier(Modifier::BOLD));

    let mut chart = BarChart::default()
        .block(block)
        .bar_width(2)
        .bar_gap(0)
        .group_gap(1);
    for group in &groups {
        chart = chart.data(group.clone());
    }
    frame.render_widget(chart, bar_area);
}

/// Horizontal bar chart, one labeled bar per row in the order given
/// (largest first puts it at the top), value labels overlaid and colors
/// ramped by magnitude.
pub fn horizontal_bar_chart(
    frame: &mut Frame,
    area: ratatui::layout::Rect,
    title: &str,
    rows: &[(String, f64)],
    ramp: ColorRamp,
) {
    let max_val = rows.iter().map(|(_, v)| *v).fold(0.0f64, f64::max).max(1.0);
    let bars: Vec<Bar> = rows
        .iter()
        .map(|(label, val)| {
            Bar::default()
                .value(val.round() as u64)
                .label(Line::from(label.clone()))
                .text_value(money_whole(*val))
                .style(Style::default().fg(ramp.color_at(val / max_val)))
        })
        .collect();

    let block = Block::default()
        .title(title.to_string())
        .title_style(Style::default().add_modifier(Modifier::BOLD));

    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

/// Vertical bar chart with one labeled bar per row, value labels on top and
/// colors ramped by magnitude.
pub fn vertical_bar_chart(
    frame: &mut Frame,
    area: ratatui::layout::Rect,
    title: &str,
    rows: &[(String, f64)],
    ramp: ColorRamp,
) {
    let max_val = rows.iter().map(|(_, v)| *v).fold(0.0f64, f64::max).max(1.0);
    let label_width = (area.width as usize / rows.len().max(1)).saturating_sub(1).max(3);
    let bars: Vec<Bar> = rows
        .iter()
        .map(|(label, val)| {
            let short: String = label.chars().take(label_width).collect();
            Bar::default()
                .value(val.round() as u64)
                .label(Line::from(short))
                .text_value(money_whole(*val))
                .style(Style::default().fg(ramp.color_at(val / max_val)))
        })
        .collect();

    let block = Block::default()
        .title(title.to_string())
        .title_style(Style::default().add_modifier(Modifier::BOLD));

    let chart = BarChart::default()
        .block(block)
        .bar_width((label_width as u16).min(12))
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

/// Time-ordered line chart with point markers. Points are (days since the
/// first date, amount); labels show the range endpoints.
pub fn date_line_chart(
    frame: &mut Frame,
    area: ratatui::layout::Rect,
    title: &str,
    points: &[(chrono::NaiveDate, f64)],
    style: Style,
) {
    if points.is_empty() {
        return;
    }
    let origin = points[0].0;
    let data: Vec<(f64, f64)> = points
        .iter()
        .map(|(d, v)| ((*d - origin).num_days() as f64, *v))
        .collect();
    let x_max = data.last().map(|(x, _)| *x).unwrap_or(0.0).max(1.0);
    let y_max = data.iter().map(|(_, y)| *y).fold(0.0f64, f64::max).max(1.0);

    let last_date = points[points.len() - 1].0;
    let x_labels = vec![
        origin.format("%Y-%m-%d").to_string(),
        last_date.format("%Y-%m-%d").to_string(),
    ];
    let y_labels = vec![
        "$0".to_string(),
        format_axis_amount(y_max / 2.0),
        format_axis_amount(y_max),
    ];

    let dataset = Dataset::default()
        .marker(symbols::Marker::Dot)
        .graph_type(GraphType::Line)
        .style(style)
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .title(title.to_string())
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(x_labels)
                .style(FOOTER_STYLE),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max * 1.05])
                .labels(y_labels)
                .style(FOOTER_STYLE),
        );
    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_y_axis_ticks_round_up() {
        assert_eq!(y_axis_ticks(800.0), (1000.0, 500.0));
        assert_eq!(y_axis_ticks(30000.0), (50000.0, 25000.0));
        assert_eq!(y_axis_ticks(2600000.0), (5000000.0, 2500000.0));
    }

    #[test]
    fn test_format_axis_amount() {
        assert_eq!(format_axis_amount(500.0), "$500");
        assert_eq!(format_axis_amount(1000.0), "$1k");
        assert_eq!(format_axis_amount(2500.0), "$2.5k");
        assert_eq!(format_axis_amount(1_000_000.0), "$1M");
        assert_eq!(format_axis_amount(2_500_000.0), "$2.5M");
    }

    #[test]
    fn test_color_ramp_endpoints() {
        let ramp = RED_RAMP;
        assert_eq!(
            ramp.color_at(0.0),
            Color::Rgb(ramp.light.0, ramp.light.1, ramp.light.2)
        );
        assert_eq!(
            ramp.color_at(1.0),
            Color::Rgb(ramp.dark.0, ramp.dark.1, ramp.dark.2)
        );
        // Out-of-range fractions clamp instead of overflowing.
        assert_eq!(ramp.color_at(4.0), ramp.color_at(1.0));
        assert_eq!(ramp.color_at(-1.0), ramp.color_at(0.0));
    }

    #[test]
    fn test_wrap_text_counts_lines() {
        let (wrapped, lines) = wrap_text("one two three four five six", 10);
        assert!(lines >= 3);
        assert!(wrapped.lines().all(|l| l.len() <= 10));
    }
}

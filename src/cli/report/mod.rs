pub mod text;
pub mod view;

use std::io::IsTerminal;

use crate::error::Result;

use super::ReportCommands;

pub fn dispatch(cmd: ReportCommands) -> Result<()> {
    if std::io::stdout().is_terminal() {
        let mut view = view::build_view(&cmd)?;
        crate::tui::run_report_view(view.as_mut())
    } else {
        // Non-TTY: plain text to stdout
        let s = dispatch_text(&cmd)?;
        println!("{s}");
        Ok(())
    }
}

pub(crate) fn dispatch_text(cmd: &ReportCommands) -> Result<String> {
    match cmd {
        ReportCommands::Cash => text::cash(),
        ReportCommands::Expenses { from_date, to_date } => {
            text::expenses(from_date.clone(), to_date.clone())
        }
        ReportCommands::Receivables { year, partner } => {
            text::receivables(*year, partner.clone())
        }
    }
}

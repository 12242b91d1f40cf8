//! Formatted terminal output for cycles and per-cycle tables.
//!
//! We keep formatting code in one place so:
//! - the detection/alignment code stays clean and testable
//! - output changes are localized (snapshot tests below)

use crate::domain::{CycleSet, DetectorConfig};
use crate::report::{GrowthRow, LagRow, PanelReport};
use crate::resample::{AlignedSet, months_between};

/// Run header: data source, timeline extent, detector settings.
pub fn format_summary(
    source: &str,
    aligned: &AlignedSet,
    detector: &DetectorConfig,
    detected: usize,
    missing: &[String],
) -> String {
    let mut out = String::new();

    out.push_str("=== cuts - Rate-Cut Cycle Dashboard ===\n");
    out.push_str(&format!("Source: {source}\n"));
    match (aligned.timeline().first(), aligned.timeline().last()) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Timeline: {}..{} ({} months) | series={}\n",
            first.format("%Y-%m"),
            last.format("%Y-%m"),
            aligned.timeline().len(),
            aligned.len(),
        )),
        _ => out.push_str("Timeline: empty\n"),
    }
    out.push_str(&format!(
        "Detector: drop > {:.3} | gap > {}d | cycles detected={detected}\n",
        detector.drop_threshold, detector.gap_days,
    ));
    for id in missing {
        out.push_str(&format!("  (unavailable) {id}\n"));
    }
    out.push('\n');

    out
}

/// Cycle list, most recent first.
pub fn format_cycles(cycles: &CycleSet) -> String {
    if cycles.is_empty() {
        return "No rate-cut cycles detected.\n".to_string();
    }

    let mut out = String::new();
    out.push_str("Rate-cut cycles (most recent first):\n");
    push_line(
        &mut out,
        format!("{:<4} {:<10} {:<10} {:>6}  {}", "#", "start", "end", "months", "status"),
    );
    push_line(
        &mut out,
        format!("{:-<4} {:-<10} {:-<10} {:->6}  {:-<6}", "", "", "", "", ""),
    );

    for c in cycles.iter() {
        let end = c
            .end
            .map(|e| e.format("%Y-%m").to_string())
            .unwrap_or_else(|| "-".to_string());
        let months = c
            .end
            .map(|e| months_between(c.start, e).to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = if c.is_open() { "open" } else { "closed" };
        push_line(
            &mut out,
            format!(
                "{:<4} {:<10} {:<10} {:>6}  {}",
                c.index + 1,
                c.start.format("%Y-%m").to_string(),
                end,
                months,
                status
            ),
        );
    }

    out
}

/// Pass-through lag, one row per cycle and one column per series.
pub fn format_lag_table(rows: &[LagRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let cells: Vec<(String, &str, String)> = rows
        .iter()
        .map(|r| (r.cycle.label(), r.series_id.as_str(), r.lag.to_string()))
        .collect();

    let mut out = String::from("Rate pass-through lag (months until first >=25bp decline):\n");
    out.push_str(&pivot(&cells));
    out
}

/// Spending change, one row per cycle and one column per series.
pub fn format_growth_table(rows: &[GrowthRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let cells: Vec<(String, &str, String)> = rows
        .iter()
        .map(|r| (r.cycle.label(), r.series_id.as_str(), format!("{:+.1}%", r.change_pct)))
        .collect();

    let mut out = String::from("Average spending, 12 months post-cut vs 12 months pre-cut:\n");
    out.push_str(&pivot(&cells));
    out
}

/// All panels in order: heading, business question, chart, then tables.
pub fn format_dashboard(panels: &[PanelReport]) -> String {
    let mut out = String::new();
    for report in panels {
        out.push_str(&format!("== {} ==\n", report.panel.title()));
        out.push_str(report.panel.question());
        out.push_str("\n\n");
        if let Some(chart) = &report.chart {
            out.push_str(chart);
            out.push('\n');
        }
        for table in [format_lag_table(&report.lags), format_growth_table(&report.growth)] {
            if !table.is_empty() {
                out.push_str(&table);
                out.push('\n');
            }
        }
    }
    out
}

/// Lay out `(row, column, value)` triples as a table, keeping first-seen order.
fn pivot(cells: &[(String, &str, String)]) -> String {
    let mut row_keys: Vec<&str> = Vec::new();
    let mut col_keys: Vec<&str> = Vec::new();
    for (row, col, _) in cells {
        if !row_keys.contains(&row.as_str()) {
            row_keys.push(row);
        }
        if !col_keys.contains(col) {
            col_keys.push(col);
        }
    }

    let mut out = String::new();
    let mut header = format!("{:<20}", "cycle");
    let mut rule = format!("{:-<20}", "");
    for col in &col_keys {
        header.push_str(&format!(" {:<14}", truncate(col, 14)));
        rule.push_str(&format!(" {:-<14}", ""));
    }
    push_line(&mut out, header);
    push_line(&mut out, rule);

    for row in &row_keys {
        let mut line = format!("{:<20}", truncate(row, 20));
        for col in &col_keys {
            let value = cells
                .iter()
                .find(|(r, c, _)| r == row && c == col)
                .map(|(_, _, v)| v.as_str())
                .unwrap_or("");
            line.push_str(&format!(" {value:<14}"));
        }
        push_line(&mut out, line);
    }

    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::cycles::select_recent;
    use crate::domain::{Cycle, Panel};
    use crate::report::Lag;

    fn m(y: i32, mo: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, mo, 1).unwrap()
    }

    fn two_cycles() -> CycleSet {
        select_recent(
            &[
                Cycle { index: 0, start: m(2024, 8), end: None },
                Cycle { index: 1, start: m(2019, 7), end: Some(m(2020, 4)) },
            ],
            3,
        )
    }

    #[test]
    fn cycles_table_snapshot() {
        let expected = concat!(
            "Rate-cut cycles (most recent first):\n",
            "#    start      end        months  status\n",
            "---- ---------- ---------- ------  ------\n",
            "1    2024-08    -               -  open\n",
            "2    2019-07    2020-04         9  closed\n",
        );
        assert_eq!(format_cycles(&two_cycles()), expected);
    }

    #[test]
    fn empty_cycle_set_has_a_message() {
        assert_eq!(format_cycles(&select_recent(&[], 3)), "No rate-cut cycles detected.\n");
    }

    #[test]
    fn lag_table_pivots_series_into_columns() {
        let set = two_cycles();
        let rows = vec![
            LagRow { cycle: set.cycles[0], series_id: "MORTGAGE30US".into(), lag: Lag::Months(3) },
            LagRow { cycle: set.cycles[0], series_id: "DPRIME".into(), lag: Lag::Months(1) },
            LagRow { cycle: set.cycles[1], series_id: "MORTGAGE30US".into(), lag: Lag::Beyond(24) },
        ];
        let expected = concat!(
            "Rate pass-through lag (months until first >=25bp decline):\n",
            "cycle                MORTGAGE30US   DPRIME\n",
            "-------------------- -------------- --------------\n",
            "Cut 1 (Aug 2024)     3 mo           1 mo\n",
            "Cut 2 (Jul 2019)     >24 mo\n",
        );
        assert_eq!(format_lag_table(&rows), expected);
    }

    #[test]
    fn growth_table_shows_signed_percentages() {
        let set = two_cycles();
        let rows = vec![
            GrowthRow { cycle: set.cycles[1], series_id: "PCE".into(), change_pct: -1.234 },
        ];
        let txt = format_growth_table(&rows);
        assert!(txt.contains("Cut 2 (Jul 2019)     -1.2%"));
        assert!(format_growth_table(&[]).is_empty());
    }

    #[test]
    fn dashboard_lists_panels_with_their_question() {
        let set = two_cycles();
        let panels = vec![
            PanelReport {
                panel: Panel::Lending,
                overlays: Vec::new(),
                lags: vec![LagRow { cycle: set.cycles[0], series_id: "DPRIME".into(), lag: Lag::Months(0) }],
                growth: Vec::new(),
                chart: Some("<chart>\n".into()),
            },
            PanelReport {
                panel: Panel::Credit,
                overlays: Vec::new(),
                lags: Vec::new(),
                growth: Vec::new(),
                chart: None,
            },
        ];
        let txt = format_dashboard(&panels);
        assert!(txt.starts_with("== Lending Impact ==\nShould we reprice our loan products?\n\n<chart>\n\n"));
        assert!(txt.contains("Cut 1 (Aug 2024)     0 mo"));
        assert!(txt.ends_with("== Credit Risk ==\nAre our credit models still valid?\n\n"));
    }
}

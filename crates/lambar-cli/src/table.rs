use lambar::engine::aggregate::ErrorSummary;
use lambar::engine::convergence::ConvergenceRow;
use lambar::workflows::batch::BatchReport;

/// Renders rows of cells as a plain-text table with right-aligned,
/// width-padded columns.
fn render(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let mut out = String::new();
    for (i, h) in header.iter().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(&format!("{:>width$}", h, width = widths[i]));
    }
    out.push('\n');
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push_str("  ");
            }
            out.push_str(&format!("{:>width$}", cell, width = widths[i]));
        }
        out.push('\n');
    }
    out
}

/// Formats a convergence table for the console.
pub fn render_convergence(rows: &[ConvergenceRow]) -> String {
    let header = [
        "name", "frames_a", "frames_b", "g_a", "g_b", "dF", "sd_dF", "fwd", "bwd", "dE_fwd",
        "dE_bwd", "sd_fwd", "sd_bwd", "p_ab", "p_ba", "overlap",
    ];
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.label.clone(),
                format!("{}-{}", r.start_a, r.end_a),
                format!("{}-{}", r.start_b, r.end_b),
                format!("{:.2}", r.g_a),
                format!("{:.2}", r.g_b),
                format!("{:.4}", r.delta_f),
                format!("{:.4}", r.sigma),
                format!("{:.4}", r.forward),
                format!("{:.4}", r.backward),
                format!("{:.4}", r.gap_forward),
                format!("{:.4}", r.gap_backward),
                format!("{:.4}", r.spread_forward),
                format!("{:.4}", r.spread_backward),
                format!("{:.4}", r.overlap_ab),
                format!("{:.4}", r.overlap_ba),
                format!("{:.4}", r.overlap_scalar),
            ]
        })
        .collect();
    render(&header, &cells)
}

fn summary_cells(label: &str, summary: &ErrorSummary) -> Vec<String> {
    vec![
        label.to_string(),
        format!("{:.4}", summary.sum_squares),
        format!("{:.4}", summary.first_order),
        format!("{:.4}", summary.second_order),
        format!("{:.2}", summary.max_ratio),
        format!("{:.2}", summary.min_ratio),
    ]
}

/// Formats a batch sweep for the console: one line per window, then the
/// cross-window error condensations.
pub fn render_batch(report: &BatchReport) -> String {
    let header = [
        "file", "sd_all", "sd_equ", "sd_dec", "diff_f", "sd_e", "overlap",
    ];
    let cells: Vec<Vec<String>> = report
        .entries
        .iter()
        .map(|e| {
            vec![
                e.path.display().to_string(),
                format!("{:.4}", e.summary.sigma_raw.mean),
                format!("{:.4}", e.summary.sigma_equilibrated.mean),
                format!("{:.4}", e.summary.sigma_decorrelated.mean),
                format!("{:.4}", e.summary.directional_gap.mean),
                format!("{:.4}", e.summary.directional_spread.mean),
                format!("{:.4}", e.summary.overlap_scalar.mean),
            ]
        })
        .collect();
    let mut out = render(&header, &cells);

    let mut summaries = Vec::new();
    if let Some(raw) = &report.sigma_raw {
        summaries.push(summary_cells("sd_all", raw));
    }
    if let Some(equ) = &report.sigma_equilibrated {
        summaries.push(summary_cells("sd_equ", equ));
    }
    if !summaries.is_empty() {
        out.push('\n');
        let summary_header = [
            "column",
            "sum_sq",
            "first_order",
            "second_order",
            "max/mean",
            "min/mean",
        ];
        out.push_str(&render(&summary_header, &summaries));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_aligned_to_the_widest_cell() {
        let header = ["a", "long_header"];
        let rows = vec![
            vec!["wide_cell_value".to_string(), "1".to_string()],
            vec!["x".to_string(), "22".to_string()],
        ];
        let table = render(&header, &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
    }

    #[test]
    fn empty_batch_renders_header_only() {
        let report = BatchReport {
            entries: vec![],
            skipped: 2,
            sigma_raw: None,
            sigma_equilibrated: None,
        };
        let out = render_batch(&report);
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("sd_all"));
    }
}

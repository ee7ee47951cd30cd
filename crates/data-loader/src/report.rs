use analysis_orchestrator::ComparisonResult;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Table};

const STAR: &str = "★";

fn format_value(value: Option<f64>, best: bool) -> String {
    let text = match value {
        Some(v) => format!("{}", v),
        None => "n/a".to_string(),
    };
    if best {
        format!("{} {}", text, STAR)
    } else {
        text
    }
}

/// One row per symbol, one column per metric, winning cells starred.
pub fn comparison_table(result: &ComparisonResult) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);

    let mut header = vec![Cell::new("Symbol")];
    header.extend(result.metrics.iter().map(|m| Cell::new(m.label())));
    header.push(Cell::new("Points"));
    table.set_header(header);

    for row in &result.rows {
        let mut cells = vec![Cell::new(&row.symbol)];
        cells.extend(row.cells.iter().map(|c| Cell::new(format_value(c.value, c.best))));
        cells.push(Cell::new(row.points));
        table.add_row(cells);
    }

    table
}

/// Table plus a closing line naming the overall winner.
pub fn render_comparison(result: &ComparisonResult) -> String {
    let verdict = match result.overall_winner() {
        Some(symbol) => format!("Overall: {} wins", symbol),
        None => "Overall: draw".to_string(),
    };
    format!("{}\n{}", comparison_table(result), verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_orchestrator::{ComparisonRow, Metric, MetricCell};

    fn result() -> ComparisonResult {
        let row = |symbol: &str, value: Option<f64>, best: bool, points: u32| ComparisonRow {
            symbol: symbol.to_string(),
            cells: vec![
                MetricCell { metric: Metric::Cagr, value, best },
                MetricCell { metric: Metric::Volatility, value: Some(0.021), best: !best },
            ],
            points,
        };
        ComparisonResult {
            metrics: vec![Metric::Cagr, Metric::Volatility],
            rows: vec![row("NVDA", Some(0.874), true, 1), row("ORCL", None, false, 1)],
        }
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(0.125), true), "0.125 ★");
        assert_eq!(format_value(Some(-0.3), false), "-0.3");
        assert_eq!(format_value(None, false), "n/a");
    }

    #[test]
    fn test_render_contains_metrics_and_stars() {
        let text = render_comparison(&result());

        assert!(text.contains("CAGR"));
        assert!(text.contains("Volatility"));
        assert!(text.contains("Points"));
        assert!(text.contains("0.874 ★"));
        assert!(text.contains("n/a"));
        assert!(text.ends_with("Overall: draw"));
    }
}

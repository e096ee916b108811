//! Result tables and per-dataset charts.
//!
//! Tables use a pipe layout that renders as Markdown. Charts are SVG so no
//! system fonts are needed.

use crate::analysis::{difference_labels, score_labels, DatasetSummary, FoldScores};
use crate::error::{CvError, Result};
use crate::utils::ensure_dir;
use plotters::prelude::*;
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator, TableFormat};
use prettytable::{Cell, Row, Table};
use std::path::{Path, PathBuf};

/// Saturated colours for train bars, one per model
const TRAIN_COLORS: [RGBColor; 4] = [
    RGBColor(228, 26, 28),
    RGBColor(55, 126, 184),
    RGBColor(77, 175, 74),
    RGBColor(152, 78, 163),
];

/// Pastel colours for test bars, one per model
const TEST_COLORS: [RGBColor; 4] = [
    RGBColor(251, 180, 174),
    RGBColor(179, 205, 227),
    RGBColor(204, 235, 197),
    RGBColor(222, 203, 228),
];

/// Bar centre offsets relative to the fold tick
const BAR_OFFSETS: [f64; 8] = [-0.35, -0.25, -0.15, -0.05, 0.05, 0.15, 0.25, 0.35];
const BAR_WIDTH: f64 = 0.1;

fn pipe_format() -> TableFormat {
    FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separators(&[LinePosition::Title], LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

/// Render a float the way the tables show it; NaN marks a missing run.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.6}", v)
    }
}

fn build_table(headers: Vec<String>, rows: impl Iterator<Item = (String, Vec<f64>)>) -> Table {
    let mut table = Table::new();
    table.set_format(pipe_format());

    let mut titles = vec![Cell::new("dataset")];
    titles.extend(headers.iter().map(|h| Cell::new(h)));
    table.set_titles(Row::new(titles));

    for (name, values) in rows {
        let mut cells = vec![Cell::new(&name)];
        cells.extend(
            values
                .into_iter()
                .map(|v| Cell::new(&format_value(v)).style_spec("r")),
        );
        table.add_row(Row::new(cells));
    }
    table
}

/// Mean train/test relative log-likelihood per dataset and model
pub fn score_table(summaries: &[DatasetSummary]) -> Table {
    build_table(
        score_labels(),
        summaries
            .iter()
            .map(|s| (s.name.clone(), s.means.to_vec())),
    )
}

/// Mean relative train/test gap per dataset and model
pub fn difference_table(summaries: &[DatasetSummary]) -> Table {
    build_table(
        difference_labels(),
        summaries
            .iter()
            .map(|s| (s.name.clone(), s.differences.to_vec())),
    )
}

fn plot_err<E: std::fmt::Display>(e: E) -> CvError {
    CvError::Plot(e.to_string())
}

/// `<plots_super_dir>/<kappa>/<ds_name>.svg`
pub fn plot_path(plots_super_dir: &Path, kappa: usize, ds_name: &str) -> PathBuf {
    plots_super_dir
        .join(kappa.to_string())
        .join(format!("{}.svg", ds_name))
}

/// Grouped bar chart of every fold's train/test scores for one dataset.
///
/// Missing (NaN) scores are left out. Returns the written path.
pub fn plot_fold_scores(
    plots_super_dir: &Path,
    kappa: usize,
    ds_name: &str,
    folds: &[FoldScores],
) -> Result<PathBuf> {
    let path = plot_path(plots_super_dir, kappa, ds_name);
    if let Some(dir) = path.parent() {
        ensure_dir(dir)?;
    }

    let svg_path = path.clone();
    let root = SVGBackend::new(&svg_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let finite: Vec<f64> = folds
        .iter()
        .flat_map(|f| f.flatten())
        .filter(|v| v.is_finite())
        .collect();
    if finite.is_empty() {
        root.draw(&Text::new(
            "No likelihood data",
            (420, 300),
            ("sans-serif", 20).into_font().color(&BLACK),
        ))
        .map_err(plot_err)?;
        root.present().map_err(plot_err)?;
        return Ok(path);
    }

    // Bars grow from zero, so zero is always inside the range
    let lo = finite.iter().copied().fold(0.0f64, f64::min);
    let hi = finite.iter().copied().fold(0.0f64, f64::max);
    let pad = ((hi - lo) * 0.05).max(1e-3);

    let n = folds.len();
    let mut chart = ChartBuilder::on(&root)
        .caption(ds_name, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), (lo - pad)..(hi + pad))
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| format!("{}", x.round() as i64))
        .x_desc("fold")
        .y_desc("relative llh")
        .draw()
        .map_err(plot_err)?;

    let labels = score_labels();
    for (bar, label) in labels.iter().enumerate() {
        let model = bar / 2;
        let color = if bar % 2 == 0 {
            TRAIN_COLORS[model]
        } else {
            TEST_COLORS[model]
        };
        let offset = BAR_OFFSETS[bar];
        chart
            .draw_series(folds.iter().enumerate().filter_map(move |(t, f)| {
                let v = f.flatten()[bar];
                if !v.is_finite() {
                    return None;
                }
                let x0 = t as f64 + offset - BAR_WIDTH / 2.0;
                Some(Rectangle::new([(x0, 0.0), (x0 + BAR_WIDTH, v)], color.filled()))
            }))
            .map_err(plot_err)?
            .label(label.replace('_', " "))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::debug!("Wrote chart {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ModelScore;
    use std::fs;
    use tempfile::TempDir;

    fn summary(name: &str, first: f64) -> DatasetSummary {
        let mut means = [-1.5; 8];
        means[0] = first;
        DatasetSummary {
            name: name.to_string(),
            means,
            differences: [0.25, -0.125, 0.0, f64::NAN],
        }
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(f64::NAN), "nan");
        assert_eq!(format_value(-1.25), "-1.250000");
    }

    #[test]
    fn test_score_table_layout() {
        let rendered = score_table(&[summary("ielex", -2.0), summary("abvd", f64::NAN)]).to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with("| dataset "));
        assert!(lines[0].contains(" train_BIN "));
        assert!(lines[0].contains(" test_MK "));
        assert!(lines[0].trim_end().ends_with('|'));
        assert!(lines[1].starts_with("|---"));
        assert!(lines[2].contains("ielex"));
        assert!(lines[2].contains("-2.000000"));
        assert!(lines[3].contains("nan"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_difference_table_layout() {
        let rendered = difference_table(&[summary("ielex", -2.0)]).to_string();
        assert!(rendered.contains("diff_BIN"));
        assert!(rendered.contains("diff_MK"));
        assert!(rendered.contains("0.250000"));
        assert!(rendered.contains("-0.125000"));
        assert!(rendered.contains("nan"));
    }

    #[test]
    fn test_plot_writes_svg() {
        let dir = TempDir::new().unwrap();
        let s = |train, test| ModelScore { train, test };
        let folds = vec![
            FoldScores {
                scores: [s(-1.0, -1.2), s(-0.9, -1.1), s(-0.8, f64::NAN), s(-0.85, -1.0)],
            },
            FoldScores {
                scores: [s(-1.1, -1.3), s(-0.95, -1.0), s(-0.7, -0.9), s(-0.8, -1.05)],
            },
        ];
        let path = plot_fold_scores(dir.path(), 3, "ielex", &folds).unwrap();
        assert_eq!(path, dir.path().join("3").join("ielex.svg"));
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("relative llh"));
    }

    #[test]
    fn test_plot_without_data() {
        let dir = TempDir::new().unwrap();
        let nan = ModelScore {
            train: f64::NAN,
            test: f64::NAN,
        };
        let folds = vec![FoldScores { scores: [nan; 4] }];
        let path = plot_fold_scores(dir.path(), 2, "empty", &folds).unwrap();
        assert!(path.is_file());
    }
}

//! Standalone SVG line charts of the derived series.

use crate::config::{DatasetConfig, DerivedSeries};
use crate::query::RowRecord;
use std::collections::BTreeMap;
use std::fmt::Write;
use thiserror::Error;

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 540.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 170.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;
const Y_TICKS: usize = 5;
const PALETTE: [&str; 6] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
];

#[derive(Debug, Error, PartialEq)]
pub enum ChartError {
    #[error("No rows to plot")]
    NoData,

    #[error("Column '{0}' is missing from the rows")]
    MissingColumn(String),

    #[error("No numeric points in column '{0}'")]
    NoPoints(String),

    #[error("Failed to format chart: {0}")]
    Format(#[from] std::fmt::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_column: String,
    pub y_column: String,
    /// One line per distinct value of this column; a single line when `None`.
    pub series_column: Option<String>,
    pub x_axis_title: String,
    pub y_axis_title: String,
}

impl ChartSpec {
    pub fn for_series(series: DerivedSeries, dataset: &DatasetConfig) -> Self {
        let (title, y_axis_title) = match series {
            DerivedSeries::MacroRegionEmploymentMean => (
                "Media Variazione % Occupazione per Macroarea",
                "Variazione Percentuale (%)",
            ),
            DerivedSeries::NationalEmploymentMean => (
                "Media Variazione % Occupazione Nazionale",
                "Variazione Percentuale (%)",
            ),
            DerivedSeries::MacroRegionValueAddedMean => (
                "Media % Valore Aggiunto per Macroarea",
                "Valore Aggiunto Medio (%)",
            ),
            DerivedSeries::MacroRegionProductivityTotal => (
                "Produttività Totale per Macroarea",
                "Produttività Totale (migliaia di €)",
            ),
            DerivedSeries::NationalProductivityTotal => (
                "Produttività Totale Nazionale",
                "Produttività Totale (migliaia di €)",
            ),
        };
        Self {
            title: title.to_string(),
            x_column: dataset.year_column.clone(),
            y_column: dataset.derived_value_column(series).to_string(),
            series_column: series
                .is_macro_region()
                .then(|| dataset.macro_region_column.clone()),
            x_axis_title: "Anno".to_string(),
            y_axis_title: y_axis_title.to_string(),
        }
    }
}

type Lines = BTreeMap<String, Vec<(f64, f64)>>;

fn collect_lines(spec: &ChartSpec, rows: &[RowRecord]) -> Result<Lines, ChartError> {
    let first = rows.first().ok_or(ChartError::NoData)?;
    let columns = [Some(&spec.x_column), Some(&spec.y_column), spec.series_column.as_ref()];
    for column in columns.into_iter().flatten() {
        if !first.contains_key(column) {
            return Err(ChartError::MissingColumn(column.clone()));
        }
    }

    let mut lines = Lines::new();
    for row in rows {
        let x = row.get(&spec.x_column).and_then(|v| v.as_f64());
        let y = row.get(&spec.y_column).and_then(|v| v.as_f64());
        let (Some(x), Some(y)) = (x, y) else {
            continue;
        };
        let name = match &spec.series_column {
            Some(column) => match row.get(column) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Null) | None => continue,
                Some(other) => other.to_string(),
            },
            None => spec.y_column.clone(),
        };
        lines.entry(name).or_default().push((x, y));
    }
    if lines.is_empty() {
        return Err(ChartError::NoPoints(spec.y_column.clone()));
    }
    for points in lines.values_mut() {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    Ok(lines)
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Renders `rows` as an SVG document: one polyline with markers per line,
/// year on the x axis and a legend when there is more than one line.
pub fn render_line_chart(spec: &ChartSpec, rows: &[RowRecord]) -> Result<String, ChartError> {
    let lines = collect_lines(spec, rows)?;
    let all_points = || lines.values().flatten();
    let (x_min, x_max) = bounds(all_points().map(|p| p.0));
    let (y_min, y_max) = bounds(all_points().map(|p| p.1));

    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let sx = |x: f64| MARGIN_LEFT + (x - x_min) / (x_max - x_min) * plot_width;
    let sy = |y: f64| MARGIN_TOP + plot_height - (y - y_min) / (y_max - y_min) * plot_height;

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="18" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        MARGIN_TOP / 2.0,
        escape(&spec.title)
    )?;

    // Axes.
    let bottom = MARGIN_TOP + plot_height;
    writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{bottom}" x2="{}" y2="{bottom}" stroke="black"/>"#,
        MARGIN_LEFT + plot_width
    )?;
    writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{bottom}" stroke="black"/>"#
    )?;

    for i in 0..=Y_TICKS {
        let value = y_min + (y_max - y_min) * i as f64 / Y_TICKS as f64;
        let y = sy(value);
        writeln!(
            svg,
            r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#e0e0e0"/>"##,
            MARGIN_LEFT + plot_width
        )?;
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
            MARGIN_LEFT - 6.0,
            y + 4.0,
            format_tick((value * 100.0).round() / 100.0)
        )?;
    }

    let first_year = x_min.ceil() as i64;
    let last_year = x_max.floor() as i64;
    let step = ((last_year - first_year) / 10).max(1);
    for year in (first_year..=last_year).step_by(step as usize) {
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            sx(year as f64),
            bottom + 18.0,
            year
        )?;
    }

    writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        HEIGHT - 20.0,
        escape(&spec.x_axis_title)
    )?;
    writeln!(
        svg,
        r#"<text x="20" y="{:.1}" text-anchor="middle" transform="rotate(-90 20 {:.1})">{}</text>"#,
        MARGIN_TOP + plot_height / 2.0,
        MARGIN_TOP + plot_height / 2.0,
        escape(&spec.y_axis_title)
    )?;

    for (index, (name, points)) in lines.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        let coords: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{:.1},{:.1}", sx(*x), sy(*y)))
            .collect();
        writeln!(
            svg,
            r#"<polyline fill="none" stroke="{color}" stroke-width="2" points="{}"/>"#,
            coords.join(" ")
        )?;
        for (x, y) in points {
            writeln!(
                svg,
                r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="{color}"><title>{}: {}</title></circle>"#,
                sx(*x),
                sy(*y),
                format_tick(*x),
                y
            )?;
        }

        if spec.series_column.is_some() {
            let legend_y = MARGIN_TOP + 20.0 * index as f64;
            let legend_x = WIDTH - MARGIN_RIGHT + 20.0;
            writeln!(
                svg,
                r#"<rect x="{legend_x}" y="{:.1}" width="12" height="12" fill="{color}"/>"#,
                legend_y - 10.0
            )?;
            writeln!(
                svg,
                r#"<text x="{}" y="{legend_y}">{}</text>"#,
                legend_x + 18.0,
                escape(name)
            )?;
        }
    }

    writeln!(svg, "</svg>")?;
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: serde_json::Value) -> Vec<RowRecord> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn renders_one_line_per_macro_region() {
        let dataset = DatasetConfig::default();
        let spec = ChartSpec::for_series(DerivedSeries::MacroRegionProductivityTotal, &dataset);
        let data = rows(json!([
            {"Anno": 2019, "Macro Area": "Isole", "Produttivita_Totale_Macroarea_Migliaia_Euro": 10.0},
            {"Anno": 2020, "Macro Area": "Isole", "Produttivita_Totale_Macroarea_Migliaia_Euro": 12.5},
            {"Anno": 2019, "Macro Area": "Sud", "Produttivita_Totale_Macroarea_Migliaia_Euro": 7.0},
            {"Anno": 2020, "Macro Area": "Sud", "Produttivita_Totale_Macroarea_Migliaia_Euro": null},
        ]));

        let svg = render_line_chart(&spec, &data).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains(">Isole</text>"));
        assert!(svg.contains("Produttività Totale per Macroarea"));
    }

    #[test]
    fn renders_single_line_without_legend() {
        let dataset = DatasetConfig::default();
        let spec = ChartSpec::for_series(DerivedSeries::NationalEmploymentMean, &dataset);
        assert_eq!(spec.series_column, None);
        let data = rows(json!([
            {"Anno": 2020, "Media_Nazionale_Variazione_Percentuale_Occupazione": 1.0},
        ]));

        let svg = render_line_chart(&spec, &data).unwrap();
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert!(!svg.contains("<rect x="));
    }

    #[test]
    fn reports_unusable_input() {
        let dataset = DatasetConfig::default();
        let spec = ChartSpec::for_series(DerivedSeries::NationalEmploymentMean, &dataset);
        assert_eq!(render_line_chart(&spec, &[]), Err(ChartError::NoData));

        let data = rows(json!([{"Anno": 2020, "Other": 1.0}]));
        assert_eq!(
            render_line_chart(&spec, &data),
            Err(ChartError::MissingColumn(spec.y_column.clone()))
        );

        let data = rows(json!([
            {"Anno": 2020, "Media_Nazionale_Variazione_Percentuale_Occupazione": null}
        ]));
        assert_eq!(
            render_line_chart(&spec, &data),
            Err(ChartError::NoPoints(spec.y_column.clone()))
        );
    }

    #[test]
    fn escapes_text() {
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}

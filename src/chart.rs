//! Terminal line chart of a grid snapshot.

use cellflow_engine::chart::ChartSnapshot;
use textplots::{AxisBuilder, Chart, LabelBuilder, LabelFormat, LineStyle, Plot, Shape};

use crate::config::{MIN_CHART_HEIGHT, MIN_CHART_WIDTH};

/// Draw one line per column that holds any non-zero value, x = row number.
/// Returns `None` when there is nothing to plot.
pub fn render_chart(snapshot: &ChartSnapshot, width: u32, height: u32) -> Option<String> {
    let columns: Vec<(String, Vec<(f32, f32)>)> = snapshot
        .column_labels
        .iter()
        .enumerate()
        .filter_map(|(col, label)| Some((label.clone(), snapshot.series(col)?)))
        .filter(|(_, points)| points.iter().any(|(_, y)| *y != 0.0))
        .collect();
    if columns.is_empty() {
        return None;
    }

    let xmin = 1.0f32;
    let xmax = (snapshot.row_labels.len() as f32).max(2.0);
    let (ymin, ymax) = snapshot.value_range();

    // textplots draws axes at x=0, y=0, so minimums are shifted to the origin.
    let shifted: Vec<Vec<(f32, f32)>> = columns
        .iter()
        .map(|(_, points)| points.iter().map(|(x, y)| (x - xmin, y - ymin)).collect())
        .collect();
    let shapes: Vec<Shape> = shifted.iter().map(|points| Shape::Lines(points)).collect();

    let mut chart = Chart::new_with_y_range(
        width.max(MIN_CHART_WIDTH),
        height.max(MIN_CHART_HEIGHT),
        0.0,
        xmax - xmin,
        0.0,
        ymax - ymin,
    );
    let mut chart = chart
        .x_label_format(LabelFormat::Custom(Box::new(move |v| {
            format!("{:.0}", v + xmin)
        })))
        .y_label_format(LabelFormat::Custom(Box::new(move |v| {
            format!("{:.1}", v + ymin)
        })))
        .x_axis_style(LineStyle::Solid)
        .y_axis_style(LineStyle::Solid);
    for shape in &shapes {
        chart = chart.lineplot(shape);
    }
    chart.borders();
    chart.axis();
    chart.figures();

    let legend: Vec<&str> = columns.iter().map(|(label, _)| label.as_str()).collect();
    Some(format!("{}\nColumns: {}", chart.frame(), legend.join(", ")))
}

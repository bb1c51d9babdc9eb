use crate::models::{ChartAnimation, ChartConfig, ChartData, ChartDataset, ChartDescription, ChartKind, ChartOptions};

const ANIMATION_DURATION_MS: u32 = 1000;

/// Map a model-produced chart description onto a Chart.js configuration.
///
/// Bar charts get the full color list as per-bar fills. Line charts take only
/// the first color as the stroke, and no color at all when the list is empty.
pub fn build_chart_config(description: &ChartDescription) -> ChartConfig {
    let (background_color, border_color) = match description.kind {
        ChartKind::Bar => (Some(description.colors.clone()), None),
        ChartKind::Line => (None, description.colors.first().cloned()),
    };

    ChartConfig {
        kind: description.kind,
        data: ChartData {
            labels: description.labels.clone(),
            datasets: vec![ChartDataset {
                label: description.series_name.clone(),
                data: description.values.clone(),
                border_width: 1,
                background_color,
                border_color,
            }],
        },
        options: ChartOptions {
            responsive: true,
            maintain_aspect_ratio: false,
            animation: ChartAnimation {
                duration: ANIMATION_DURATION_MS,
            },
        },
    }
}

//! SVG pie chart of the label distribution in the session history.

use shared::{HistorySummary, SentimentLabel};
use std::f64::consts::PI;
use yew::prelude::*;

const SIZE: f64 = 200.0;
const RADIUS: f64 = 90.0;
const CENTER: f64 = SIZE / 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: SentimentLabel,
    pub count: usize,
    /// Percentage of the whole history.
    pub share: f64,
    /// SVG path data; `None` when the slice is the full circle.
    pub path: Option<String>,
}

pub fn label_color(label: SentimentLabel) -> &'static str {
    match label {
        SentimentLabel::Positive => "#2e9e5b",
        SentimentLabel::Negative => "#d64545",
    }
}

fn point(angle: f64) -> (f64, f64) {
    (CENTER + RADIUS * angle.cos(), CENTER + RADIUS * angle.sin())
}

/// Slices clockwise from twelve o'clock, one per label present in the history.
pub fn pie_slices(summary: &HistorySummary) -> Vec<PieSlice> {
    let breakdown = summary.breakdown();
    let single = breakdown.len() == 1;
    let mut start = -PI / 2.0;

    breakdown
        .into_iter()
        .map(|(label, count)| {
            let share = summary.share(label);
            let sweep = share / 100.0 * 2.0 * PI;
            let end = start + sweep;

            let path = (!single).then(|| {
                let (x1, y1) = point(start);
                let (x2, y2) = point(end);
                let large_arc = if sweep > PI { 1 } else { 0 };
                format!(
                    "M {c:.2} {c:.2} L {x1:.2} {y1:.2} A {r:.2} {r:.2} 0 {large_arc} 1 {x2:.2} {y2:.2} Z",
                    c = CENTER,
                    r = RADIUS,
                )
            });
            start = end;

            PieSlice {
                label,
                count,
                share,
                path,
            }
        })
        .collect()
}

pub fn render_pie_chart(summary: &HistorySummary) -> Html {
    let slices = pie_slices(summary);
    if slices.is_empty() {
        return html! { <p class="empty-chart">{"No predictions yet."}</p> };
    }

    html! {
        <div class="pie-chart">
            <svg width={SIZE.to_string()} height={SIZE.to_string()} viewBox={format!("0 0 {} {}", SIZE, SIZE)}>
                { for slices.iter().map(|slice| match &slice.path {
                    Some(path) => html! { <path d={path.clone()} fill={label_color(slice.label)} /> },
                    None => html! {
                        <circle
                            cx={CENTER.to_string()}
                            cy={CENTER.to_string()}
                            r={RADIUS.to_string()}
                            fill={label_color(slice.label)}
                        />
                    },
                }) }
            </svg>
            <ul class="pie-legend">
                { for slices.iter().map(|slice| html! {
                    <li>
                        <span class="legend-swatch" style={format!("background: {}", label_color(slice.label))}></span>
                        { format!("{}: {} ({:.1}%)", slice.label, slice.count, slice.share) }
                    </li>
                }) }
            </ul>
        </div>
    }
}

//! Chart generation for the dashboard.
//!
//! - **Trend chart**: an interactive ECharts line chart of monthly signed totals.
//! - **Category chart**: a static SVG pie chart of expenses by category, embedded as a
//!   base64 data URI.

use std::{collections::BTreeMap, f64::consts::PI};

use base64::{Engine, engine::general_purpose::STANDARD};
use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisLabel, AxisType, JsFunction, Symbol, Tooltip, Trigger},
    series::Line,
};
use maud::{Markup, PreEscaped, html};

use crate::{
    dashboard::aggregation::{expenses_by_category, month_labels_and_values, monthly_totals},
    html::HeadElement,
    transaction::Transaction,
};

/// The ECharts build loaded by pages with interactive charts.
pub(super) const ECHARTS_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    HeadElement::ScriptSource(PreEscaped(format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    )))
}

/// A line chart of the signed monthly totals, or `None` if there are no transactions.
pub(super) fn trend_chart(transactions: &[Transaction]) -> Option<Chart> {
    let totals = monthly_totals(transactions);

    if totals.is_empty() {
        return None;
    }

    let (labels, values) = month_labels_and_values(&totals);

    let chart = Chart::new()
        .title(Title::new().text("Financial trend").subtext("Net balance per month"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(currency_formatter()),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .name("Month")
                .axis_label(AxisLabel::new().rotate(45))
                .data(labels),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .name("Balance")
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            Line::new()
                .name("Balance")
                .symbol(Symbol::Circle)
                .symbol_size(8)
                .data(values),
        );

    Some(chart)
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

const PIE_SIZE: f64 = 600.0;
const PIE_CENTER_X: f64 = 300.0;
const PIE_CENTER_Y: f64 = 320.0;
const PIE_RADIUS: f64 = 210.0;
const PIE_TITLE: &str = "Expense breakdown by category";
/// The matplotlib "tab10" palette.
const PIE_COLORS: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

struct PieSlice<'a> {
    category: &'a str,
    share: f64,
    start_angle: f64,
    end_angle: f64,
    color: &'static str,
}

/// Point on the pie circle at `angle` radians, counter-clockwise from 3 o'clock.
fn point_at(angle: f64, radius: f64) -> (f64, f64) {
    (
        PIE_CENTER_X + radius * angle.cos(),
        PIE_CENTER_Y - radius * angle.sin(),
    )
}

fn slice_path(slice: &PieSlice<'_>) -> String {
    let (start_x, start_y) = point_at(slice.start_angle, PIE_RADIUS);
    let (end_x, end_y) = point_at(slice.end_angle, PIE_RADIUS);
    let large_arc = u8::from(slice.end_angle - slice.start_angle > PI);

    format!(
        "M {PIE_CENTER_X:.2} {PIE_CENTER_Y:.2} L {start_x:.2} {start_y:.2} \
         A {PIE_RADIUS:.2} {PIE_RADIUS:.2} 0 {large_arc} 0 {end_x:.2} {end_y:.2} Z"
    )
}

fn pie_slices(category_totals: &BTreeMap<String, f64>, total: f64) -> Vec<PieSlice<'_>> {
    // Slices start at 12 o'clock and run counter-clockwise.
    let mut angle = PI / 2.0;

    category_totals
        .iter()
        .filter(|(_, amount)| **amount > 0.0)
        .enumerate()
        .map(|(i, (category, amount))| {
            let share = amount / total;
            let start_angle = angle;
            angle += share * 2.0 * PI;

            PieSlice {
                category,
                share,
                start_angle,
                end_angle: angle,
                color: PIE_COLORS[i % PIE_COLORS.len()],
            }
        })
        .collect()
}

fn pie_svg(category_totals: &BTreeMap<String, f64>, total: f64) -> Markup {
    let slices = pie_slices(category_totals, total);
    let view_box = format!("0 0 {PIE_SIZE} {PIE_SIZE}");

    html! {
        svg xmlns="http://www.w3.org/2000/svg" width=(PIE_SIZE) height=(PIE_SIZE) viewBox=(view_box)
        {
            rect width="100%" height="100%" fill="white" {}

            text x=(PIE_CENTER_X) y="40" text-anchor="middle" font-family="sans-serif" font-size="20"
            {
                (PIE_TITLE)
            }

            @for slice in &slices {
                @if slices.len() == 1 || slice.share >= 1.0 {
                    circle cx=(PIE_CENTER_X) cy=(PIE_CENTER_Y) r=(PIE_RADIUS) fill=(slice.color) {}
                } @else {
                    path d=(slice_path(slice)) fill=(slice.color) stroke="white" {}
                }
            }

            @for slice in &slices {
                @let middle = (slice.start_angle + slice.end_angle) / 2.0;
                @let (share_x, share_y) = point_at(middle, PIE_RADIUS * 0.6);
                @let (label_x, label_y) = point_at(middle, PIE_RADIUS * 1.1);
                @let anchor = if middle.cos() < 0.0 { "end" } else { "start" };

                text
                    x=(format!("{share_x:.2}"))
                    y=(format!("{share_y:.2}"))
                    text-anchor="middle"
                    font-family="sans-serif"
                    font-size="14"
                {
                    (format!("{:.1}%", slice.share * 100.0))
                }

                text
                    x=(format!("{label_x:.2}"))
                    y=(format!("{label_y:.2}"))
                    text-anchor=(anchor)
                    font-family="sans-serif"
                    font-size="14"
                {
                    (slice.category)
                }
            }
        }
    }
}

/// A pie chart of expenses by category as a `data:image/svg+xml;base64,...` URI.
///
/// Returns `None` if there are no expenses with a positive total.
pub(super) fn category_pie_chart(transactions: &[Transaction]) -> Option<String> {
    let category_totals = expenses_by_category(transactions);
    let total: f64 = category_totals.values().sum();

    if category_totals.is_empty() || total <= 0.0 {
        return None;
    }

    let svg = pie_svg(&category_totals, total).into_string();

    Some(format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)))
}

#[cfg(test)]
mod tests {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use scraper::{Html, Selector};
    use time::macros::datetime;

    use crate::{
        dashboard::aggregation::test_data::transaction,
        transaction::{Transaction, TransactionType},
    };

    use super::{DashboardChart, category_pie_chart, charts_script, trend_chart};

    fn example_transactions() -> Vec<Transaction> {
        vec![
            transaction(TransactionType::Income, 1000.0, "", datetime!(2025-01-03 10:00)),
            transaction(TransactionType::Expense, 400.0, "food", datetime!(2025-01-20 18:30)),
            transaction(TransactionType::Expense, 100.0, "food", datetime!(2025-02-01 00:00)),
        ]
    }

    fn decode_svg(data_uri: &str) -> Html {
        let encoded = data_uri
            .strip_prefix("data:image/svg+xml;base64,")
            .expect("missing data URI prefix");
        let svg = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();

        Html::parse_fragment(&svg)
    }

    fn texts(document: &Html) -> Vec<String> {
        let selector = Selector::parse("text").unwrap();
        document
            .select(&selector)
            .map(|element| element.text().collect())
            .collect()
    }

    #[test]
    fn trend_chart_has_one_point_per_month() {
        let chart = trend_chart(&example_transactions()).unwrap();
        // The options embed JS formatter functions, so compare compacted text instead of JSON.
        let options: String = chart
            .to_string()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        assert!(
            options.contains(r#""data":["2025-01","2025-02"]"#),
            "got {options}"
        );
        assert!(
            options.contains("[600.0,-100.0]") || options.contains("[600,-100]"),
            "got {options}"
        );
        assert!(options.contains(r#""type":"line""#), "got {options}");
        assert!(options.contains(r#""symbol":"circle""#), "got {options}");
        assert!(options.contains(r#""rotate":45"#), "got {options}");
    }

    #[test]
    fn trend_chart_is_none_without_transactions() {
        assert!(trend_chart(&[]).is_none());
    }

    #[test]
    fn pie_chart_groups_expenses_by_category() {
        let data_uri = category_pie_chart(&example_transactions()).unwrap();
        let document = decode_svg(&data_uri);

        let texts = texts(&document);
        assert!(texts.contains(&"food".to_owned()), "got {texts:?}");
        assert!(texts.contains(&"100.0%".to_owned()), "got {texts:?}");
        assert!(texts.contains(&"Expense breakdown by category".to_owned()));
        // a single category is a full circle
        assert_eq!(document.select(&Selector::parse("circle").unwrap()).count(), 1);
    }

    #[test]
    fn pie_chart_labels_empty_category_as_other() {
        let transactions = [
            transaction(TransactionType::Expense, 75.0, "", datetime!(2025-01-03 10:00)),
            transaction(TransactionType::Expense, 25.0, "rent", datetime!(2025-01-04 10:00)),
            transaction(TransactionType::Income, 500.0, "salary", datetime!(2025-01-05 10:00)),
        ];

        let document = decode_svg(&category_pie_chart(&transactions).unwrap());

        let texts = texts(&document);
        assert!(texts.contains(&"Other".to_owned()), "got {texts:?}");
        assert!(texts.contains(&"75.0%".to_owned()), "got {texts:?}");
        assert!(texts.contains(&"25.0%".to_owned()), "got {texts:?}");
        assert!(!texts.contains(&"salary".to_owned()), "got {texts:?}");
        assert_eq!(document.select(&Selector::parse("path").unwrap()).count(), 2);
    }

    #[test]
    fn pie_chart_draws_full_circle_when_other_categories_are_zero() {
        let transactions = [
            transaction(TransactionType::Expense, 100.0, "food", datetime!(2025-01-03 10:00)),
            transaction(TransactionType::Expense, 0.0, "misc", datetime!(2025-01-04 10:00)),
        ];

        let document = decode_svg(&category_pie_chart(&transactions).unwrap());

        assert_eq!(document.select(&Selector::parse("circle").unwrap()).count(), 1);
        assert_eq!(document.select(&Selector::parse("path").unwrap()).count(), 0);
        let texts = texts(&document);
        assert!(texts.contains(&"100.0%".to_owned()), "got {texts:?}");
        assert!(!texts.contains(&"misc".to_owned()), "got {texts:?}");
    }

    #[test]
    fn pie_chart_is_none_without_expenses() {
        let income_only = [transaction(
            TransactionType::Income,
            500.0,
            "",
            datetime!(2025-01-05 10:00),
        )];

        assert!(category_pie_chart(&[]).is_none());
        assert!(category_pie_chart(&income_only).is_none());
    }

    #[test]
    fn charts_script_initializes_each_chart() {
        let charts = [DashboardChart {
            id: "trend-chart",
            options: "{}".to_owned(),
        }];

        let crate::html::HeadElement::ScriptSource(script) = charts_script(&charts) else {
            panic!("expected inline script");
        };

        assert!(script.0.contains("document.getElementById(\"trend-chart\")"));
        assert!(script.0.contains("DOMContentLoaded"));
    }
}

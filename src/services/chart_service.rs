use chrono::{Duration, NaiveDate};
use plotly::common::{DashType, Fill, Line, Marker, Mode, Title};
use plotly::layout::{Axis, GridPattern, HoverMode, LayoutGrid};
use plotly::{Layout, Plot, Scatter};

use crate::models::{Dataset, Forecast, SeasonalityMode};
use crate::services::seasonal_model::SeasonalModel;

const LINE_COLOR: &str = "#166534";
const BAND_COLOR: &str = "rgba(22, 101, 52, 0.18)";

fn date_labels<'a>(dates: impl Iterator<Item = &'a NaiveDate>) -> Vec<String> {
    dates.map(|d| d.format("%Y-%m-%d").to_string()).collect()
}

/// Observed prices, point forecast and uncertainty band.
pub fn forecast_chart(dataset: &Dataset, forecast: &Forecast) -> Plot {
    let ds = date_labels(forecast.rows.iter().map(|r| &r.ds));

    let lower = Scatter::new(ds.clone(), forecast.rows.iter().map(|r| r.yhat_lower).collect())
        .mode(Mode::Lines)
        .name("Borne basse")
        .line(Line::new().width(0.0).color(BAND_COLOR))
        .show_legend(false);

    let upper = Scatter::new(ds.clone(), forecast.rows.iter().map(|r| r.yhat_upper).collect())
        .mode(Mode::Lines)
        .name("Borne haute")
        .line(Line::new().width(0.0).color(BAND_COLOR))
        .fill(Fill::ToNextY)
        .fill_color(BAND_COLOR)
        .show_legend(false);

    let predicted = Scatter::new(ds, forecast.rows.iter().map(|r| r.yhat).collect())
        .mode(Mode::Lines)
        .name("Prevision")
        .line(Line::new().width(3.0).color(LINE_COLOR));

    let actual = Scatter::new(
        date_labels(dataset.observations.iter().map(|o| &o.ds)),
        dataset.values(),
    )
    .mode(Mode::Markers)
    .name("Observe")
    .marker(Marker::new().size(5).color("#111827"));

    let layout = Layout::new()
        .title(Title::with_text("Evolution mensuelle du prix du mais (FCFA/tonne)"))
        .x_axis(Axis::new().title(Title::with_text("Date")))
        .y_axis(Axis::new().title(Title::with_text("Prix")))
        .hover_mode(HoverMode::XUnified)
        .height(600);

    let mut plot = Plot::new();
    plot.add_trace(lower);
    plot.add_trace(upper);
    plot.add_trace(predicted);
    plot.add_trace(actual);
    plot.set_layout(layout);
    plot
}

/// Trend over the forecast frame, then one panel per seasonality over a
/// single period starting 2017-01-01.
pub fn components_chart(model: &SeasonalModel, forecast: &Forecast) -> Plot {
    let mut plot = Plot::new();
    let ds = date_labels(forecast.rows.iter().map(|r| &r.ds));

    plot.add_trace(
        Scatter::new(ds.clone(), forecast.rows.iter().map(|r| r.trend_lower).collect())
            .mode(Mode::Lines)
            .line(Line::new().width(0.0).color(BAND_COLOR))
            .show_legend(false),
    );
    plot.add_trace(
        Scatter::new(ds.clone(), forecast.rows.iter().map(|r| r.trend_upper).collect())
            .mode(Mode::Lines)
            .line(Line::new().width(0.0).color(BAND_COLOR))
            .fill(Fill::ToNextY)
            .fill_color(BAND_COLOR)
            .show_legend(false),
    );
    plot.add_trace(
        Scatter::new(ds, forecast.rows.iter().map(|r| r.trend).collect())
            .mode(Mode::Lines)
            .name("trend")
            .line(Line::new().width(2.0).color(LINE_COLOR)),
    );

    let multiplicative = model.config().seasonality_mode == SeasonalityMode::Multiplicative;
    let start = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default();
    let mut axes = vec![(Axis::new().title(Title::with_text("trend")), Axis::new().title(Title::with_text("ds")))];

    for (i, s) in model.config().seasonalities.iter().enumerate() {
        let days = s.period_days.ceil() as i64;
        let dates: Vec<NaiveDate> = (0..days).map(|d| start + Duration::days(d)).collect();
        let Some(values) = model.seasonal_profile(&s.name, &dates) else {
            continue;
        };
        let values: Vec<f64> = if multiplicative {
            values.iter().map(|v| v * 100.0).collect()
        } else {
            values
        };
        let axis_id = i + 2;
        plot.add_trace(
            Scatter::new(date_labels(dates.iter()), values)
                .mode(Mode::Lines)
                .name(&s.name)
                .line(Line::new().width(2.0).color(LINE_COLOR).dash(DashType::Solid))
                .x_axis(&format!("x{}", axis_id))
                .y_axis(&format!("y{}", axis_id)),
        );
        let y_title = if multiplicative {
            format!("{} (%)", s.name)
        } else {
            s.name.clone()
        };
        axes.push((
            Axis::new().title(Title::with_text(&y_title)),
            Axis::new().title(Title::with_text("Jour de la periode")).tick_format("%d %b"),
        ));
    }

    let mut layout = Layout::new()
        .grid(
            LayoutGrid::new()
                .rows(axes.len())
                .columns(1)
                .pattern(GridPattern::Independent),
        )
        .show_legend(false)
        .height(720);

    for (i, (y_axis, x_axis)) in axes.into_iter().enumerate() {
        layout = match i {
            0 => layout.y_axis(y_axis).x_axis(x_axis),
            1 => layout.y_axis2(y_axis).x_axis2(x_axis),
            2 => layout.y_axis3(y_axis).x_axis3(x_axis),
            3 => layout.y_axis4(y_axis).x_axis4(x_axis),
            4 => layout.y_axis5(y_axis).x_axis5(x_axis),
            5 => layout.y_axis6(y_axis).x_axis6(x_axis),
            6 => layout.y_axis7(y_axis).x_axis7(x_axis),
            7 => layout.y_axis8(y_axis).x_axis8(x_axis),
            _ => layout,
        };
    }
    plot.set_layout(layout);
    plot
}

/// HTML fragment for embedding in the dashboard; plotly.js is loaded by the page.
pub fn render_inline(plot: &Plot, div_id: &str) -> String {
    plot.to_inline_html(Some(div_id))
}

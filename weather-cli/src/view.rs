//! Text rendering of the controller state.

use chrono::{Days, FixedOffset, NaiveDate};
use weather_core::{DayOffset, ForecastStatus, Phase, State, ViewKind, WeatherView};

/// Short weekday name for `today + offset`, e.g. `Mon`.
pub fn day_label(offset: DayOffset, today: NaiveDate) -> String {
    today
        .checked_add_days(Days::new(u64::from(offset.days())))
        .map(|date| date.format("%a").to_string())
        .unwrap_or_else(|| format!("+{offset}"))
}

pub fn render(state: &State, utc_offset: FixedOffset) -> String {
    let mut out = String::new();

    if let Some(error) = state.error() {
        out.push_str(error);
        out.push('\n');
    }

    if state.phase() == Phase::Loading {
        out.push_str("Loading...\n");
    }

    if let Some(view) = state.view() {
        out.push_str(&render_view(view, utc_offset));
        if let ForecastStatus::Failed(_) = state.forecast() {
            out.push_str("Forecast unavailable.\n");
        }
    }

    out
}

fn render_view(view: &WeatherView, utc_offset: FixedOffset) -> String {
    let subtitle = match view.kind {
        ViewKind::Current => "Current Weather".to_string(),
        ViewKind::Forecast => format!(
            "Forecast for {}",
            view.timestamp.with_timezone(&utc_offset).format("%A, %b %-d")
        ),
    };

    format!(
        "{name}, {country}\n\
         {subtitle}\n\
         {description}\n\
         Temp: {temp:.1} °C | Humidity: {humidity} % | Wind: {wind:.1} km/h\n",
        name = view.name,
        country = view.country,
        description = view.condition.description,
        temp = view.temperature_c,
        humidity = view.humidity_pct,
        wind = view.wind_kmh,
    )
}

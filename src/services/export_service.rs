use csv::Writer;

use crate::errors::AppError;
use crate::models::Forecast;

pub const EXPORT_FILE_NAME: &str = "previsions_mais_benin.csv";

/// Column order of the exported forecast table
pub fn export_columns(forecast: &Forecast) -> Vec<String> {
    let mut columns: Vec<String> = [
        "ds",
        "trend",
        "yhat_lower",
        "yhat_upper",
        "trend_lower",
        "trend_upper",
        "multiplicative_terms",
        "multiplicative_terms_lower",
        "multiplicative_terms_upper",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();

    for name in &forecast.seasonality_names {
        columns.push(name.clone());
        columns.push(format!("{}_lower", name));
        columns.push(format!("{}_upper", name));
    }

    columns.extend(
        ["additive_terms", "additive_terms_lower", "additive_terms_upper", "yhat"]
            .iter()
            .map(|c| c.to_string()),
    );
    columns
}

/// Full forecast table (history + future) as UTF-8 CSV.
/// Components are point estimates, so their bounds repeat the value.
pub fn forecast_to_csv(forecast: &Forecast) -> Result<Vec<u8>, AppError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(export_columns(forecast))?;

    for row in &forecast.rows {
        let mut record = vec![
            row.ds.format("%Y-%m-%d").to_string(),
            row.trend.to_string(),
            row.yhat_lower.to_string(),
            row.yhat_upper.to_string(),
            row.trend_lower.to_string(),
            row.trend_upper.to_string(),
        ];
        push_triple(&mut record, row.multiplicative_terms);
        for value in &row.seasonal {
            push_triple(&mut record, *value);
        }
        push_triple(&mut record, row.additive_terms);
        record.push(row.yhat.to_string());

        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}

fn push_triple(record: &mut Vec<String>, value: f64) {
    let value = value.to_string();
    record.push(value.clone());
    record.push(value.clone());
    record.push(value);
}

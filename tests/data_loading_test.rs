/// CSV ingestion tests
///
/// Covers the processed `ds,y` file, the raw FAO export fallback and the
/// not-found error, using temporary data directories laid out like `data/`.
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use maize_forecast::config::DataPaths;
use maize_forecast::errors::AppError;
use maize_forecast::models::DataSource;
use maize_forecast::services::data_loader::load_dataset;
use tempfile::tempdir;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const RAW_FAO: &str = "\
Iso3,StartDate,EndDate,Area Code,Area,Item Code,Item,Element Code,Element,Year Code,Year,Months Code,Months,Unit,Value,Flag
#country+code,#date+start,#date+end,,#country+name,,#item+name,,#indicator+type,,#date+year,,#date+month,#indicator+unit,#value,
BEN,2019-02-01,2019-02-28,53,Benin,56,Maize (corn),5532,Producer Price (LCU/tonne),2019,2019,7002,February,LCU,121000,A
BEN,2019-01-01,2019-01-31,53,Benin,56,Maize (corn),5532,Producer Price (LCU/tonne),2019,2019,7001,January,LCU,118500,A
BEN,2019-01-01,2019-12-31,53,Benin,56,Maize (corn),5532,Producer Price (LCU/tonne),2019,2019,7021,Annual value,LCU,125000,A
BEN,2019-01-01,2019-01-31,53,Benin,27,Rice,5532,Producer Price (LCU/tonne),2019,2019,7001,January,LCU,300000,A
BEN,2019-01-01,2019-01-31,53,Benin,56,Maize (corn),5531,Producer Price (SLC/tonne),2019,2019,7001,January,SLC,118500,A
BEN,2019-03-01,2019-03-31,53,Benin,56,Maize (corn),5532,Producer Price (LCU/tonne),2019,2019,7003,March,LCU,,A
BEN,2019-04-01,2019-04-30,53,Benin,56,Maize (corn),5532,Producer Price (LCU/tonne),2019,2019,7004,April,LCU,130250.5,A
";

#[test]
fn test_processed_csv_is_sorted_and_cleaned() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::from_dir(dir.path());
    write(
        &paths.processed,
        "ds,y\n2020-03-01,140000\n2020-01-01,120000\nnot-a-date,1\n2020-02-01,\n2020-02-01 00:00:00,130000\n",
    );

    let dataset = load_dataset(&paths).unwrap();
    assert_eq!(dataset.source, DataSource::Processed(paths.processed.clone()));
    assert_eq!(dataset.dates(), vec![date(2020, 1, 1), date(2020, 2, 1), date(2020, 3, 1)]);
    assert_eq!(dataset.values(), vec![120000.0, 130000.0, 140000.0]);
    assert!(dataset.observations.windows(2).all(|w| w[0].ds <= w[1].ds));
    assert!(dataset.observations.iter().all(|o| o.y.is_finite()));
}

#[test]
fn test_processed_csv_with_extra_columns() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::from_dir(dir.path());
    write(&paths.processed, "region,ds,y\nBenin,2021-01-01,100\nBenin,2021-02-01,110\n");

    let dataset = load_dataset(&paths).unwrap();
    assert_eq!(dataset.len(), 2);
}

#[test]
fn test_raw_fao_filters_maize_monthly_rows() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::from_dir(dir.path());
    write(&paths.raw, RAW_FAO);

    let dataset = load_dataset(&paths).unwrap();
    assert_eq!(dataset.source, DataSource::RawFao(paths.raw.clone()));
    assert_eq!(
        dataset.dates(),
        vec![date(2019, 1, 1), date(2019, 2, 1), date(2019, 4, 1)]
    );
    assert_eq!(dataset.values(), vec![118500.0, 121000.0, 130250.5]);
}

#[test]
fn test_processed_without_columns_falls_back_to_raw() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::from_dir(dir.path());
    write(&paths.processed, "date,price\n2019-01-01,1\n");
    write(&paths.raw, RAW_FAO);

    let dataset = load_dataset(&paths).unwrap();
    assert!(matches!(dataset.source, DataSource::RawFao(_)));
}

#[test]
fn test_processed_header_with_spaces_falls_back_to_raw() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::from_dir(dir.path());
    write(&paths.processed, "ds, y\n2020-01-01,1\n2020-02-01,2\n");
    write(&paths.raw, RAW_FAO);

    let dataset = load_dataset(&paths).unwrap();
    assert_eq!(dataset.source, DataSource::RawFao(paths.raw.clone()));
    assert_eq!(dataset.len(), 3);
}

#[test]
fn test_missing_files_report_both_paths() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::from_dir(dir.path());

    let err = load_dataset(&paths).unwrap_err();
    assert!(matches!(err, AppError::DataNotFound { .. }));
    let msg = err.to_string();
    assert!(msg.contains("maize_prices_monthly.csv"));
    assert!(msg.contains("producer-prices_ben.csv"));
}

#[test]
fn test_single_row_is_insufficient() {
    let dir = tempdir().unwrap();
    let paths = DataPaths::from_dir(dir.path());
    write(&paths.processed, "ds,y\n2020-01-01,100\n");

    let err = load_dataset(&paths).unwrap_err();
    assert!(matches!(err, AppError::InsufficientData { got: 1, .. }));
}

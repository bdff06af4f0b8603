//! End-to-end tests: provider tables in, output tables out.

use approx::assert_relative_eq;
use mara::data::MemoryProvider;
use mara::indicators::ApiSpec;
use mara::{
    AggregateMethod, DateRange, FetchOptions, Frequency, IndicatorFetcher, IndicatorRegistry,
    build_output_tables, select_securities,
};
use polars::prelude::*;

fn codes(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

/// Two fiscal years of year-to-date figures for A and B, with a restated
/// 2023 annual report for A.
fn quarterly_table() -> DataFrame {
    df!(
        "ts_code" => [
            "A", "A", "A", "A", "A", "A", "A", "A", "A",
            "B", "B", "B", "B", "B", "B", "B", "B",
        ],
        "ann_date" => [
            "20220429", "20220830", "20221029", "20230320",
            "20230428", "20230830", "20231028", "20240320", "20240420",
            "20220429", "20220830", "20221029", "20230320",
            "20230428", "20230830", "20231028", "20240320",
        ],
        "end_date" => [
            "20220331", "20220630", "20220930", "20221231",
            "20230331", "20230630", "20230930", "20231231", "20231231",
            "20220331", "20220630", "20220930", "20221231",
            "20230331", "20230630", "20230930", "20231231",
        ],
        "update_flag" => [
            "0", "0", "0", "0", "0", "0", "0", "0", "1",
            "0", "0", "0", "0", "0", "0", "0", "0",
        ],
        "q_profit_yoy" => [
            10.0, 25.0, 40.0, 60.0, 5.0, 12.0, 20.0, 30.0, 33.0,
            1.0, 2.0, 3.0, 4.0, 2.0, 4.0, 6.0, 8.0,
        ]
    )
    .unwrap()
}

fn listing() -> DataFrame {
    df!(
        "ts_code" => ["A", "B", "C"],
        "name" => ["Alpha", "Beta", "Gamma"],
        "industry" => ["银行", "银行", "保险"],
        "market" => ["主板", "主板", "创业板"],
        "area" => ["上海", "深圳", "深圳"],
        "list_date" => ["19991110", "19910403", "20100101"]
    )
    .unwrap()
}

fn cumulative_registry() -> IndicatorRegistry {
    IndicatorRegistry::from_specs([ApiSpec::new(
        "fina_indicator",
        ["ts_code", "ann_date", "end_date", "update_flag", "q_profit_yoy"],
        true,
    )])
}

fn two_years() -> DateRange {
    DateRange::from_cli(Some("2022-01-01"), Some("2023-12-31")).unwrap()
}

#[tokio::test]
async fn test_single_quarter_year_end_scenario() {
    let registry = cumulative_registry();
    let provider = MemoryProvider::new().with_table("fina_indicator", quarterly_table());
    let fetcher = IndicatorFetcher::new(&provider, &registry);
    let options = FetchOptions::new(["q_profit_yoy"])
        .date_range(two_years())
        .single(true)
        .season(4);

    let results = fetcher
        .fetch_indicators(&codes(&["A", "B"]), &options)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let data = &results[0].data;
    assert_eq!(results[0].frequency, Frequency::Quarterly);
    assert_eq!(
        strings(data, "ts_code"),
        vec![
            Some("A".to_string()),
            Some("A".to_string()),
            Some("B".to_string()),
            Some("B".to_string())
        ]
    );
    assert_eq!(
        strings(data, "end_date"),
        vec![
            Some("20221231".to_string()),
            Some("20231231".to_string()),
            Some("20221231".to_string()),
            Some("20231231".to_string())
        ]
    );
    // A 2023 uses the updated 33.0 disclosure: 33 - 20.
    assert_eq!(
        floats(data, "q_profit_yoy"),
        vec![Some(20.0), Some(13.0), Some(1.0), Some(2.0)]
    );
}

#[tokio::test]
async fn test_single_year_window_gives_one_row_per_security() {
    let registry = cumulative_registry();
    let provider = MemoryProvider::new().with_table("fina_indicator", quarterly_table());
    let fetcher = IndicatorFetcher::new(&provider, &registry);
    let options = FetchOptions::new(["q_profit_yoy"])
        .date_range(DateRange::from_cli(Some("2023-01-01"), Some("2023-12-31")).unwrap())
        .single(true)
        .season(4);

    let results = fetcher
        .fetch_indicators(&codes(&["A", "B"]), &options)
        .await
        .unwrap();

    let data = &results[0].data;
    assert_eq!(data.height(), 2);
    assert_eq!(floats(data, "q_profit_yoy"), vec![Some(13.0), Some(2.0)]);
}

#[tokio::test]
async fn test_default_options_keep_every_quarter() {
    let registry = cumulative_registry();
    let provider = MemoryProvider::new().with_table("fina_indicator", quarterly_table());
    let fetcher = IndicatorFetcher::new(&provider, &registry);
    let options = FetchOptions::new(["q_profit_yoy"]).date_range(two_years());

    let results = fetcher
        .fetch_indicators(&codes(&["B"]), &options)
        .await
        .unwrap();

    let data = &results[0].data;
    assert_eq!(data.height(), 8);
    assert_eq!(
        floats(data, "q_profit_yoy"),
        vec![
            Some(1.0),
            Some(2.0),
            Some(3.0),
            Some(4.0),
            Some(2.0),
            Some(4.0),
            Some(6.0),
            Some(8.0)
        ]
    );
}

#[tokio::test]
async fn test_builtin_catalog_keeps_ratios_cumulative() {
    let registry = IndicatorRegistry::builtin();
    let provider = MemoryProvider::new().with_table("fina_indicator", quarterly_table());
    let fetcher = IndicatorFetcher::new(&provider, &registry);
    let options = FetchOptions::new(["q_profit_yoy"])
        .date_range(two_years())
        .single(true)
        .season(4);

    let results = fetcher
        .fetch_indicators(&codes(&["A"]), &options)
        .await
        .unwrap();

    assert_eq!(
        floats(&results[0].data, "q_profit_yoy"),
        vec![Some(60.0), Some(33.0)]
    );
}

#[tokio::test]
async fn test_selection_to_output_tables() {
    let mut registry = IndicatorRegistry::builtin();
    registry
        .register_custom_indicator("code_len", |securities| {
            let lengths: Vec<f64> = securities
                .column("ts_code")?
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|code| code.map_or(0.0, |c| c.len() as f64))
                .collect();
            Ok(Series::new("code_len".into(), lengths))
        })
        .unwrap();
    let provider = MemoryProvider::new()
        .with_table("stock_basic", listing())
        .with_table("fina_indicator", quarterly_table());

    let selection = select_securities(&provider, &codes(&["银行"])).await.unwrap();
    assert_eq!(selection.ts_codes, codes(&["A", "B"]));

    let fetcher = IndicatorFetcher::new(&provider, &registry);
    let options = FetchOptions::new(["q_profit_yoy", "code_len"])
        .date_range(two_years())
        .season(4)
        .aggregate(Some(AggregateMethod::Median));
    let results = fetcher
        .fetch_indicators(&selection.ts_codes, &options)
        .await
        .unwrap();
    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["q_profit_yoy", "code_len"]);

    let tables = build_output_tables(&selection.basic_info, &results).unwrap();
    assert_eq!(tables.len(), 2);

    let aggregated = &tables[0];
    assert_eq!(aggregated.frequency, Frequency::Aggregated);
    assert!(!aggregated.has_period());
    let columns: Vec<String> = aggregated
        .data
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(
        columns,
        vec![
            "ts_code",
            "name",
            "industry",
            "market",
            "area",
            "list_date",
            "ann_date",
            "end_date",
            "q_profit_yoy"
        ]
    );
    let medians = floats(&aggregated.data, "q_profit_yoy");
    assert_relative_eq!(medians[0].unwrap(), 46.5);
    assert_relative_eq!(medians[1].unwrap(), 6.0);

    let custom = &tables[1];
    assert_eq!(custom.frequency, Frequency::Custom);
    assert_eq!(floats(&custom.data, "code_len"), vec![Some(1.0), Some(1.0)]);
    assert_eq!(
        strings(&custom.data, "name"),
        vec![Some("Alpha".to_string()), Some("Beta".to_string())]
    );
}

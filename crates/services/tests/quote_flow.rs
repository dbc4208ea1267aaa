use std::sync::Arc;

use slm_core::model::{QuoteInputError, QuoteRequest, WorkOrderDraft};
use slm_core::time::fixed_clock;
use slm_services::{AppServices, QuoteConfig};
use slm_storage::repository::Storage;

async fn sqlite_services(name: &str) -> AppServices {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    AppServices::new_sqlite(&url, QuoteConfig::default(), fixed_clock())
        .await
        .expect("open sqlite services")
}

#[tokio::test]
async fn seeded_history_drives_the_quote() {
    let services = sqlite_services("memdb_quote_flow").await;

    let steel = services
        .efficiency()
        .material_efficiency("316L Stainless Steel")
        .await
        .unwrap();
    assert!((steel.efficiency - 680.0 / 12_828.0).abs() < 1e-12);
    assert!((steel.efficiency - 0.053).abs() < 1e-3);
    assert_eq!(steel.source_label(), "based on 5 records");

    let request = QuoteRequest::new("316L Stainless Steel", 100.0)
        .with_difficulty(2)
        .with_risk(0.5)
        .with_post_process(2.0, 120.0)
        .validate(&services.config())
        .unwrap();

    let quote = services.quotes().calculate_quote(&request).await.unwrap();
    assert!((quote.cost_per_min - 1_500_000.0 / 475_200.0).abs() < 1e-12);
    assert!((quote.time_min - 100.0 * 12_828.0 / 680.0).abs() < 1e-9);
    assert_eq!(quote.time_formatted, "31h 26min");
    assert_eq!(quote.difficulty_label, "hard");
    assert!((quote.coefficient - 2.25).abs() < 1e-12);
    assert!((quote.post_process_price - 240.0).abs() < 1e-9);
    assert!((quote.total_quote - (quote.base_print_price * 2.25 + 240.0)).abs() < 1e-6);
    assert!(quote.total_formatted.starts_with('¥'));
    assert_eq!(quote.total_formatted, services.quotes().format_quote(quote.total_quote));
}

#[tokio::test]
async fn lattice_records_do_not_move_the_estimate() {
    let services = sqlite_services("memdb_lattice_flow").await;
    let before = services
        .efficiency()
        .material_efficiency("TC4 Titanium Alloy")
        .await
        .unwrap();

    services
        .work_orders()
        .record(WorkOrderDraft::from_hours_minutes(
            "TC4 Titanium Alloy",
            400.0,
            1.0,
            0.0,
            true,
            "lattice cage",
        ))
        .await
        .unwrap();

    let after = services
        .efficiency()
        .material_efficiency("TC4 Titanium Alloy")
        .await
        .unwrap();
    assert_eq!(before, after);

    let stats = services.statistics().overview_stats().await.unwrap();
    assert_eq!(stats.total_orders, 11);
    assert_eq!(stats.valid_orders, 10);
    assert_eq!(stats.lattice_orders, 1);
    assert_eq!(stats.per_material_counts[1].orders, 6);
}

#[tokio::test]
async fn padded_material_name_quotes_from_recorded_history() {
    let services = sqlite_services("memdb_padded_name_flow").await;
    let padded = " 316L Stainless Steel ";

    services
        .work_orders()
        .record(WorkOrderDraft::from_hours_minutes(padded, 53.0, 16.0, 40.0, false, ""))
        .await
        .unwrap();

    let request = QuoteRequest::new(padded, 100.0)
        .validate(&services.config())
        .unwrap();
    assert_eq!(request.material_name, "316L Stainless Steel");

    let quote = services.quotes().calculate_quote(&request).await.unwrap();
    assert_eq!(quote.efficiency.source_label(), "based on 6 records");
    assert!((quote.efficiency.efficiency - 733.0 / 13_828.0).abs() < 1e-12);
}

#[tokio::test]
async fn boundary_rejects_non_positive_weight() {
    let services = sqlite_services("memdb_boundary_flow").await;
    let err = QuoteRequest::new("316L Stainless Steel", 0.0)
        .validate(&services.config())
        .unwrap_err();
    assert_eq!(err, QuoteInputError::NonPositiveWeight(0.0));
}

#[tokio::test]
async fn cost_table_agrees_with_the_active_machine() {
    let services = sqlite_services("memdb_cost_table_flow").await;
    services.machines().select("DW-HP200", 1).await.unwrap();

    let table = services.cost_calculator().catalog_cost_table();
    let current = services
        .cost_calculator()
        .current_cost_per_minute()
        .await
        .unwrap();
    assert!((table["DW-HP200"][&1] - current).abs() < f64::EPSILON);
    assert!(table["DW-HP120"][&1] > table["DW-HP120"][&2]);
}

#[tokio::test]
async fn unknown_material_quotes_from_fallback() {
    let services = sqlite_services("memdb_unknown_flow").await;
    let quote = services
        .quotes()
        .calculate_quote(&QuoteRequest::new("Inconel 718", 10.0))
        .await
        .unwrap();
    assert_eq!(quote.efficiency.source_label(), "default");
    assert_eq!(quote.efficiency.sample_count, 0);
    assert!((quote.efficiency.efficiency - 0.05).abs() < f64::EPSILON);
}

#[tokio::test]
async fn concurrent_selection_keeps_one_active_config() {
    let storage = Storage::in_memory();
    let machines_repo = Arc::clone(&storage.machines);
    let services = AppServices::from_storage(storage, QuoteConfig::default(), fixed_clock())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..12_u32 {
        let machines = services.machines();
        handles.push(tokio::spawn(async move {
            let name = if i % 2 == 0 { "DW-HP120" } else { "DW-HP200" };
            machines.select(name, i % 3 + 1).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let configs = machines_repo.list_configs().await.unwrap();
    assert_eq!(configs.iter().filter(|c| c.is_active()).count(), 1);
    assert!(services.machines().current().await.unwrap().is_some());
}

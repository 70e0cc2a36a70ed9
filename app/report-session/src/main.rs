//! FILENAME: app/report-session/src/main.rs
// PURPOSE: Demo driver: runs one scripted report builder session over the sales demo data.
// USAGE: report-demo [config.json] [log file]

use std::path::PathBuf;

use chrono::Utc;
use report_engine::{AggregationOp, FieldFilter, NumberRange, ReportSchema, SaveMode, SortOrder};
use report_session::{
    demo_lookup, log_error, log_info, MemorySink, MemoryStore, ReportSession, SaveForm,
    SalesDemoSource, SessionConfig,
};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run().await {
        log_error!("DEMO", "{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> report_session::Result<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SessionConfig::from_json_file(&PathBuf::from(path))?,
        None => SessionConfig::default(),
    };
    if let Some(log_path) = args.next() {
        report_session::logging::init_log_file(&PathBuf::from(log_path))?;
    }

    let source = SalesDemoSource::new(Utc::now().date_naive());
    let mut session = ReportSession::new(
        config.clone(),
        ReportSchema::sales_demo(),
        &source,
        Box::new(MemoryStore::new()),
    )?;

    let lookup = demo_lookup(&config);
    session.load_options("category", &lookup).await;

    session.set_filter("orders", Some(FieldFilter::Number(NumberRange::at_least(200.0))))?;
    session.set_aggregation("totalSales", AggregationOp::Sum)?;
    session.set_aggregation("orders", AggregationOp::Avg)?;
    session.set_sort("totalSales", SortOrder::Descend)?;

    let view = session.view();
    log_info!(
        "DEMO",
        "flat view: {} of {} records, page {}/{}",
        view.filtered_count,
        view.source_count,
        view.pagination.page,
        view.page_count()
    );
    println!("{}", serde_json::to_string_pretty(view)?);

    session.add_group("state")?;
    for header in session.view().group_headers() {
        println!("{} ({} rows)", header.label(), header.member_count());
    }

    let mut sink = MemorySink::new();
    let form = SaveForm::new("Big orders by state", "Sales", SaveMode::SaveAsNew);
    let definition = session.save(&form, &mut sink)?;
    println!("{}", definition.to_json()?);
    Ok(())
}

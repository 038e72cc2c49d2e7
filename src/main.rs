//! Scheduler entry point: CLI wiring and config-driven planning.

use std::process;

use chrono::Utc;
use tracing::info;

use solar_shift::catalog::LoadCatalog;
use solar_shift::cli::{self, CliOptions};
use solar_shift::config::ScenarioConfig;
use solar_shift::forecast::{ForecastCache, ForecastProvider};
use solar_shift::io::export::{export_schedule_csv, export_timeline_csv};
use solar_shift::io::import::load_catalog_csv;
use solar_shift::runner::{DayPlan, plan_day};
use solar_shift::schedule::engine::NO_CONTROLLABLE_LOADS;
use solar_shift::schedule::types::DayGrid;
use solar_shift::telemetry;

fn load_scenario(cli: &CliOptions) -> Result<ScenarioConfig, String> {
    let mut scenario = match (&cli.scenario, &cli.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path),
        (None, Some(name)) => ScenarioConfig::from_preset(name),
        (None, None) => Ok(ScenarioConfig::campus()),
    }
    .map_err(|e| e.to_string())?;

    if let Some(path) = &cli.forecast {
        scenario.forecast.source = "csv".to_string();
        scenario.forecast.path = Some(path.clone());
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        return Err(errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"));
    }
    Ok(scenario)
}

fn build_catalog(cli: &CliOptions, scenario: &ScenarioConfig) -> Result<LoadCatalog, String> {
    let result = match &cli.catalog {
        Some(path) => load_catalog_csv(path).and_then(|records| {
            LoadCatalog::from_records(records, scenario.base_load()?)
        }),
        None => scenario.build_catalog(),
    };
    result.map_err(|e| format!("error: invalid load catalog: {e}"))
}

fn build_plan(cli: &CliOptions, scenario: &ScenarioConfig) -> Result<DayPlan, String> {
    let tz = scenario.timezone().map_err(|e| e.to_string())?;
    let grid = match cli.date {
        Some(date) => DayGrid::new(date, tz),
        None => DayGrid::tomorrow_in(tz, Utc::now()),
    };
    let catalog = build_catalog(cli, scenario)?;

    let source = scenario.forecast_source().map_err(|e| e.to_string())?;
    info!(
        site = %scenario.site.name,
        date = %grid.date(),
        provider = source.name(),
        devices = catalog.controllable().len(),
        base_devices = catalog.base_devices().len(),
        "planning day"
    );

    let mut cache = ForecastCache::new(source, scenario.cache_ttl());
    let points = cache
        .get(&scenario.site(), &grid)
        .map_err(|e| format!("error: forecast unavailable: {e}"))?;

    plan_day(
        grid,
        &points,
        scenario.forecast.cadence_minutes,
        &catalog,
        &scenario.scheduler(),
    )
    .map_err(|e| format!("error: invalid forecast data: {e}"))
}

fn print_plan(site: &str, plan: &DayPlan) {
    println!(
        "Schedule for {site}, {} ({})",
        plan.grid.date(),
        plan.grid.tz().name()
    );
    println!();
    println!("{}", plan.summary);
    println!();

    println!("--- Timeline ---");
    if plan.report.has_controllable_loads() {
        for interval in &plan.timeline {
            println!(
                "{:<24} {} - {}  ({} min)",
                interval.label(),
                interval.start.format("%H:%M"),
                interval.end.format("%Y-%m-%d %H:%M"),
                interval.duration_minutes()
            );
        }
    } else {
        println!("{NO_CONTROLLABLE_LOADS}");
    }
    println!();

    println!("{}", plan.kpi);

    let over: Vec<&str> = plan
        .report
        .placements
        .iter()
        .filter(|p| p.over_capacity)
        .map(|p| p.device.as_str())
        .collect();
    if !over.is_empty() {
        println!();
        println!("Placed above the capacity ceiling: {}", over.join(", "));
    }
    if !plan.report.rejected.is_empty() {
        println!();
        println!("--- Constraint violations ---");
        for err in &plan.report.rejected {
            println!("{err}");
        }
    }
    if !plan.report.forecast_gaps.is_empty() {
        println!();
        println!(
            "Forecast missing for {} slots; treated as zero generation.",
            plan.report.forecast_gaps.len()
        );
    }
}

fn main() {
    telemetry::init_tracing();

    let cli = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(2);
        }
    };
    if cli.help {
        cli::print_usage();
        return;
    }

    let scenario = load_scenario(&cli).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let plan = build_plan(&cli, &scenario).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    print_plan(&scenario.site.name, &plan);

    if let Some(path) = &cli.schedule_out {
        if let Err(e) = export_schedule_csv(&plan.report.table, path) {
            eprintln!("error: failed to write schedule CSV: {e}");
            process::exit(1);
        }
        info!(path = %path.display(), "schedule written");
    }
    if let Some(path) = &cli.timeline_out {
        if let Err(e) = export_timeline_csv(&plan.timeline, path) {
            eprintln!("error: failed to write timeline CSV: {e}");
            process::exit(1);
        }
        info!(path = %path.display(), "timeline written");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(solar_shift::api::AppState {
            site_name: scenario.site.name.clone(),
            capacity_kw: scenario.scheduler().capacity_kw(),
            plan,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(solar_shift::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}

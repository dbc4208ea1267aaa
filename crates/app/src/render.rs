use slm_core::model::{QuoteBreakdown, WorkOrder};
use slm_core::pricing::{format_duration, format_money};
use slm_services::{ActiveMachine, CostTable, MaterialEfficiency, OverviewStats, SeedReport};

pub fn quote(q: &QuoteBreakdown, currency: &str) -> String {
    [
        format!("Material          {}", q.material_name),
        format!("Weight            {:.2} g", q.weight_g),
        format!(
            "Efficiency        {:.4} g/min ({})",
            q.efficiency.efficiency,
            q.efficiency.source_label()
        ),
        format!("Machine rate      {:.4} /min", q.cost_per_min),
        format!("Print time        {} ({:.1} min)", q.time_formatted, q.time_min),
        format!("Base print price  {}", format_money(q.base_print_price, currency)),
        format!(
            "Difficulty        {} (x{:.2})",
            q.difficulty_label, q.difficulty_factor
        ),
        format!("Risk              +{:.0}%", q.risk * 100.0),
        format!("Coefficient       x{:.2}", q.coefficient),
        format!("Print price       {}", format_money(q.print_price, currency)),
        format!(
            "Post-processing   {:.1} h x {} = {}",
            q.post_process_hours,
            format_money(q.post_process_rate, currency),
            format_money(q.post_process_price, currency)
        ),
        format!("Total             {}", q.total_formatted),
    ]
    .join("\n")
}

pub fn materials(rows: &[MaterialEfficiency]) -> String {
    if rows.is_empty() {
        return "no materials".into();
    }
    rows.iter()
        .map(|row| {
            format!(
                "{:<24} {:.4} g/min  {}",
                row.material_name,
                row.estimate.efficiency,
                row.estimate.source_label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn stats(stats: &OverviewStats) -> String {
    let mut lines = vec![
        format!("total orders    {}", stats.total_orders),
        format!("valid orders    {}", stats.valid_orders),
        format!("lattice orders  {}", stats.lattice_orders),
    ];
    lines.extend(
        stats
            .per_material_counts
            .iter()
            .map(|row| format!("  {:<24} {}", row.material_name, row.orders)),
    );
    lines.join("\n")
}

pub fn cost_table(table: &CostTable, currency: &str) -> String {
    let years: Vec<u32> = table
        .values()
        .next()
        .map(|row| row.keys().copied().collect())
        .unwrap_or_default();

    let header = years
        .iter()
        .fold(format!("{:<12}", "machine"), |acc, y| {
            acc + &format!(" {:>12}", format!("{y} yr"))
        });
    let rows = table.iter().map(|(machine, row)| {
        row.values().fold(format!("{machine:<12}"), |acc, rate| {
            acc + &format!(" {:>12}", format_money(*rate, currency))
        })
    });
    std::iter::once(header).chain(rows).collect::<Vec<_>>().join("\n")
}

pub fn machine(active: Option<&ActiveMachine>, currency: &str) -> String {
    match active {
        Some(active) => format!(
            "{} | {} over {} year(s) | {}/min",
            active.config.machine_name(),
            format_money(price_as_amount(active.config.total_price()), currency),
            active.config.depreciation_years(),
            format_money(active.cost_per_min, currency)
        ),
        None => "no active machine configuration (machine cost is 0)".into(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn price_as_amount(price: u64) -> f64 {
    price as f64
}

pub fn orders(orders: &[WorkOrder]) -> String {
    if orders.is_empty() {
        return "no work orders".into();
    }
    orders
        .iter()
        .map(|o| {
            let mut line = format!(
                "#{:<5} {}  {:<24} {:>8.1} g  {:>10}  {:.4} g/min",
                o.id().value(),
                o.created_at().format("%Y-%m-%d %H:%M"),
                o.material_name(),
                o.weight_g(),
                format_duration(o.time_min()),
                o.efficiency()
            );
            if o.is_lattice() {
                line.push_str("  [lattice]");
            }
            if !o.note().is_empty() {
                line.push_str("  ");
                line.push_str(o.note());
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn seed(report: SeedReport) -> String {
    if report.is_empty() {
        return "store already seeded, nothing to do".into();
    }
    format!(
        "seeded {} material(s), {} work order(s){}",
        report.materials,
        report.work_orders,
        if report.machine_activated {
            ", activated default machine"
        } else {
            ""
        }
    )
}

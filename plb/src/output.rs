//! Plan output formatters: a right-aligned dry-run table and a JSON dump,
//! following `horcrux-cli::output`'s `print_table`/`print_json` plus its
//! `colored`-styled status lines.

use colored::Colorize;
use plb_core::model::{ClusterState, MigrationPlan};
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::settings::{Alignment, Style};
use tabled::Tabled;

#[derive(Tabled)]
struct MigrationRow {
    #[tabled(rename = "VM")]
    vm: String,
    #[tabled(rename = "Current Node")]
    current_node: String,
    #[tabled(rename = "Rebalanced Node")]
    rebalanced_node: String,
}

/// Print the plan as a right-aligned `VM | Current Node | Rebalanced Node`
/// table. Prints a plain status line instead of an empty table when there
/// is nothing to move.
pub fn print_table(plan: &MigrationPlan) {
    if plan.is_empty() {
        println!("{}", "cluster already balanced - no migrations planned".yellow());
        return;
    }

    let rows: Vec<MigrationRow> = plan
        .iter()
        .map(|m| MigrationRow {
            vm: m.vm_name.clone(),
            current_node: m.from_node.clone(),
            rebalanced_node: m.to_node.clone(),
        })
        .collect();

    let mut table = tabled::Table::new(rows);
    table.with(Style::rounded()).with(Alignment::right());
    println!("{table}");
}

#[derive(Serialize)]
struct VmPlanRecord {
    vmid: u32,
    node_parent: String,
    node_rebalance: String,
    cpu_used: u64,
    cpu_total: u64,
    memory_used: u64,
    memory_total: u64,
    disk_used: u64,
    disk_total: u64,
}

/// Print the plan as a JSON object keyed by VM name, each value the VM's
/// finalised record (vmid, parent/rebalance node, per-dimension counters).
pub fn print_json(plan: &MigrationPlan, state: &ClusterState) -> anyhow::Result<()> {
    let mut object = Map::new();
    for migration in plan {
        let Some(vm) = state.vms.get(&migration.vm_name) else {
            continue;
        };
        let record = VmPlanRecord {
            vmid: vm.vmid,
            node_parent: vm.node_parent.clone(),
            node_rebalance: vm.node_rebalance.clone(),
            cpu_used: vm.cpu.used,
            cpu_total: vm.cpu.total,
            memory_used: vm.memory.used,
            memory_total: vm.memory.total,
            disk_used: vm.disk.used,
            disk_total: vm.disk.total,
        };
        object.insert(migration.vm_name.clone(), serde_json::to_value(record)?);
    }

    println!("{}", serde_json::to_string_pretty(&Value::Object(object))?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

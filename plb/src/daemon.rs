//! The sleep/repeat driver around one planning cycle: fetch → plan →
//! (execute unless dry-run) → sleep `schedule` hours → repeat. Follows the
//! `tokio::time::sleep` loop in `horcrux-cli::commands::monitor`'s `Watch`
//! command, extended with `tokio::select!`-driven cancellation so Ctrl-C is
//! honoured between phases rather than only at the top of the loop.

use crate::client_http::ProxmoxClient;
use crate::config::PlbConfig;
use crate::output;
use plb_core::error::PlbError;
use plb_core::model::ClusterState;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run a single fetch → plan → (execute) cycle. Individual migration
/// failures are logged and isolated; they do not abort the cycle.
pub async fn run_cycle(
    client: &ProxmoxClient,
    config: &PlbConfig,
    dry_run: bool,
    json: bool,
) -> Result<(), PlbError> {
    let policy = config.policy()?;

    let mut state: ClusterState = plb_core::snapshot::build_snapshot(client, &config.snapshot_config())
        .await
        .map_err(|e| PlbError::ApiUnreachable(e.to_string()))?;

    let mut rng = StdRng::from_entropy();
    let plan = plb_core::plan(&mut state, &policy, &mut rng);

    if dry_run {
        if json {
            let _ = output::print_json(&plan, &state);
        } else {
            output::print_table(&plan);
        }
        return Ok(());
    }

    for migration in &plan {
        let result = client
            .migrate(&migration.from_node, migration.vmid, &migration.to_node, true)
            .await;

        if let Err(err) = result {
            tracing::error!(
                critical = true,
                vmid = migration.vmid,
                vm_name = %migration.vm_name,
                from_node = %migration.from_node,
                to_node = %migration.to_node,
                error = %err,
                "migration rejected by hypervisor"
            );
            output::print_warning(&format!(
                "migration rejected: {} ({} -> {}): {err}",
                migration.vm_name, migration.from_node, migration.to_node
            ));
            continue;
        }
        output::print_success(&format!(
            "migrated {} ({} -> {})",
            migration.vm_name, migration.from_node, migration.to_node
        ));
    }

    if json {
        let _ = output::print_json(&plan, &state);
    }

    Ok(())
}

/// Run cycles forever at the configured schedule, or exactly once if
/// `once` is set (overriding `[service] daemon`). Cancellation is checked
/// between the cycle and the sleep, and the sleep itself is preemptible.
pub async fn run(
    client: ProxmoxClient,
    config: PlbConfig,
    dry_run: bool,
    json: bool,
    once: bool,
    cancel: CancellationToken,
) -> Result<(), PlbError> {
    client.authenticate().await.map_err(|e| PlbError::AuthFailure(e.to_string()))?;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            result = run_cycle(&client, &config, dry_run, json) => result?,
        }

        if once || !config.service.daemon {
            return Ok(());
        }

        let sleep_duration = Duration::from_secs(config.service.schedule * 3600);
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = tokio::time::sleep(sleep_duration) => {}
        }
    }
}

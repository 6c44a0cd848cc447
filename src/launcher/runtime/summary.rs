use crate::{cli::LaunchSelection, launcher::config::MinerProfile, neuron::LaunchPlan};

/// One-line description of the launch, logged before the miner starts.
pub fn build_summary(selection: &LaunchSelection, profile: &MinerProfile, plan: &LaunchPlan) -> String {
    format!(
        "Launching profile {name} ({origin}, selected via {source}) on network {network} with axon port {port}, max workers {workers}; virtualenv {venv} is {state}.",
        name = profile.name,
        origin = profile.origin,
        source = selection.profile_source.as_str(),
        network = profile.network,
        port = profile.axon_port,
        workers = profile.axon_max_workers,
        venv = plan.venv_dir.display(),
        state = if plan.activation.active { "active" } else { "missing" },
    )
}

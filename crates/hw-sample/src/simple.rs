use std::time::Instant;

use hw_core::{RngHandle, WalkError};
use hw_walk::build_walker;
use tracing::info;

use crate::config::RunConfig;
use crate::configurations::ConfigurationStore;
use crate::data::{DataWriter, Measurement};
use crate::determinism::{replica_seed, sweep_seed};
use crate::kernel::{ResolvedOutput, SamplerOutcome};
use crate::stat::{mean, Bootstrap};

/// Draws `iterations` independent walks and measures each of them.
pub(crate) fn run_simple(
    config: &RunConfig,
    layout: &ResolvedOutput,
    invocation: &str,
) -> Result<SamplerOutcome, WalkError> {
    let seeds = &config.seed_policy;
    let mut rng = RngHandle::from_seed(replica_seed(seeds.realization_seed, 0));
    let mut walker = build_walker(&config.walker_params(), &mut rng)?;

    let mut data = layout
        .data_file
        .as_deref()
        .map(DataWriter::create)
        .transpose()?;
    if let Some(data) = data.as_mut() {
        data.header(invocation, &Measurement::columns(&config.passage_time_starts))?;
    }
    let mut confs = layout
        .conf_file
        .as_deref()
        .map(ConfigurationStore::create)
        .transpose()?;

    let clock = Instant::now();
    let mut samples = Vec::with_capacity(config.iterations);
    for i in 0..config.iterations {
        let mut rng = RngHandle::from_seed(sweep_seed(seeds.mc_seed, 0, i));
        walker.generate_independent_sample(&mut rng)?;
        let m = Measurement::take(
            i,
            walker.as_ref(),
            config.observable,
            &config.passage_time_starts,
        );
        if let Some(data) = data.as_mut() {
            data.row(&m.to_row())?;
        }
        if let Some(confs) = confs.as_mut() {
            confs.append(i as u64, walker.as_ref())?;
        }
        samples.push(m);
    }

    let seconds = clock.elapsed().as_secs_f64() / config.iterations.max(1) as f64;
    let mut data_files = Vec::new();
    if let Some(mut data) = data {
        data.comment(&format!("time/sample in seconds: {seconds}"))?;
        data_files.push(data.finish()?);
    }
    let conf_file = confs.map(ConfigurationStore::finish).transpose()?;

    let series: Vec<f64> = samples.iter().map(|m| m.s).collect();
    let (_, checksum_error) = Bootstrap::default().estimate(&series, mean);
    info!(samples = samples.len(), "simple sampling finished");

    Ok(SamplerOutcome {
        equilibrated: true,
        checksum: mean(&series),
        checksum_error,
        final_states: vec![walker.random_numbers()],
        data_files,
        conf_file,
        samples,
        ..SamplerOutcome::default()
    })
}

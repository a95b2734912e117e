//! Synthetic background counters
//!
//! Steady traffic that does not depend on inbound requests: a counter with
//! constant labels, a family of series whose creation is staggered over time,
//! a counter that is reset by re-registration, and an unlabeled push-side
//! heartbeat.

use metrics::Label;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use super::pull::PullSink;
use super::push::PushSink;
use crate::config::SyntheticConfig;

pub const PROCESS_BOUND_COUNTER: &str = "process_bound_counter_total";
pub const STAGGERED_COUNTER: &str = "delayed_counters_total";

const PROCESS_BOUND_PERIOD: Duration = Duration::from_secs(1);
const STAGGERED_PERIOD: Duration = Duration::from_millis(100);
const HEARTBEAT_PERIOD: Duration = Duration::from_secs(2);
const LAZY_INCREMENT_PERIOD: Duration = Duration::from_millis(100);

/// Spawn every synthetic emitter; returns nothing when disabled
pub fn spawn_synthetic(
    config: &SyntheticConfig,
    pull: Arc<PullSink>,
    push: Arc<PushSink>,
) -> Vec<JoinHandle<()>> {
    if !config.enabled {
        return Vec::new();
    }

    let mut tasks = vec![
        tokio::spawn(process_bound_task(pull.clone())),
        tokio::spawn(heartbeat_task(push)),
        tokio::spawn(lazy_reregister_task(
            pull.clone(),
            Duration::from_secs(config.lazy_reinit_secs),
        )),
        tokio::spawn(lazy_increment_task(pull.clone())),
    ];
    let stagger = Duration::from_secs(config.stagger_secs);
    for index in 0..config.staggered_series {
        tasks.push(tokio::spawn(staggered_task(pull.clone(), index, stagger)));
    }

    info!(
        staggered_series = config.staggered_series,
        stagger_secs = config.stagger_secs,
        lazy_reinit_secs = config.lazy_reinit_secs,
        "Synthetic emitters started"
    );
    tasks
}

async fn process_bound_task(pull: Arc<PullSink>) {
    pull.describe(PROCESS_BOUND_COUNTER, "Counter with process-constant labels");
    let counter = pull.counter(
        PROCESS_BOUND_COUNTER,
        vec![Label::new("foo", "foo"), Label::new("bar", "bar")],
    );

    let mut interval = tokio::time::interval(PROCESS_BOUND_PERIOD);
    loop {
        interval.tick().await;
        counter.increment(1);
    }
}

/// Series `index` appears only after `index * stagger`
async fn staggered_task(pull: Arc<PullSink>, index: usize, stagger: Duration) {
    let delay = stagger.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
    tokio::time::sleep(delay).await;
    debug!(index, "Staggered series started");

    let counter = pull.counter(
        STAGGERED_COUNTER,
        vec![Label::new("startIndex", index.to_string())],
    );

    let mut interval = tokio::time::interval(STAGGERED_PERIOD);
    loop {
        interval.tick().await;
        counter.increment(1);
    }
}

/// The first registration happens only after one full period
async fn lazy_reregister_task(pull: Arc<PullSink>, period: Duration) {
    loop {
        tokio::time::sleep(period).await;
        pull.reregister_lazy();
        debug!("Lazy counter registered again");
    }
}

async fn lazy_increment_task(pull: Arc<PullSink>) {
    let mut interval = tokio::time::interval(LAZY_INCREMENT_PERIOD);
    loop {
        interval.tick().await;
        if !pull.increment_lazy() {
            trace!("Lazy counter not registered yet");
        }
    }
}

async fn heartbeat_task(push: Arc<PushSink>) {
    let mut interval = tokio::time::interval(HEARTBEAT_PERIOD);
    loop {
        interval.tick().await;
        push.heartbeat();
    }
}

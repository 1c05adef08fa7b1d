//! Scheduler - sequential passes over all wallets
//!
//! One wallet at a time, a random pause between wallets, a long pause between
//! passes. Stops for good once the registry is empty.

use std::time::Duration;

use rand::prelude::*;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::processor::WalletProcessor;
use crate::wallet::identity::short_address;
use crate::wallet::WalletRegistry;

/// Scheduler timing
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub min_wallet_delay: Duration,
    pub max_wallet_delay: Duration,
    pub restart_delay: Duration,
    /// Stop after this many passes (None = run until exhausted or cancelled)
    pub max_passes: Option<u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_wallet_delay: Duration::from_secs(5),
            max_wallet_delay: Duration::from_secs(10),
            restart_delay: Duration::from_secs(5 * 60 * 60),
            max_passes: None,
        }
    }
}

impl From<&Config> for SchedulerConfig {
    fn from(config: &Config) -> Self {
        Self {
            min_wallet_delay: Duration::from_millis(config.schedule.min_delay_ms),
            max_wallet_delay: Duration::from_millis(config.schedule.max_delay_ms),
            restart_delay: config.schedule.restart_delay(),
            max_passes: None,
        }
    }
}

/// Why the scheduler stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every wallet was removed
    Exhausted,
    /// Stop signal received
    Cancelled,
    /// Configured pass limit reached
    PassLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "no wallets remaining"),
            StopReason::Cancelled => write!(f, "stop requested"),
            StopReason::PassLimit => write!(f, "pass limit reached"),
        }
    }
}

/// Outcome of `Scheduler::run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Passes started (a cancelled pass counts)
    pub passes: u32,
    pub reason: StopReason,
}

/// Outcome of a single pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub removed: usize,
    pub cancelled: bool,
}

/// Owns the registry and drives the processor over it
pub struct Scheduler {
    registry: WalletRegistry,
    processor: WalletProcessor,
    config: SchedulerConfig,
    rng: StdRng,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new(
        registry: WalletRegistry,
        processor: WalletProcessor,
        config: SchedulerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            processor,
            config,
            rng: StdRng::from_entropy(),
            shutdown,
        }
    }

    /// Use a fixed seed for the inter-wallet delays
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn registry(&self) -> &WalletRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> WalletRegistry {
        self.registry
    }

    /// Run passes until no wallets remain, the pass limit is hit, or the
    /// shutdown token fires.
    pub async fn run(&mut self) -> RunReport {
        let mut passes = 0;

        loop {
            if self.registry.is_empty() {
                info!("No wallets remaining. Stopping process.");
                return RunReport {
                    passes,
                    reason: StopReason::Exhausted,
                };
            }
            if self.shutdown.is_cancelled() {
                return RunReport {
                    passes,
                    reason: StopReason::Cancelled,
                };
            }

            passes += 1;
            info!("Starting pass {} over {} wallets", passes, self.registry.active_count());
            let pass = self.run_pass().await;

            info!(
                "Pass {} done: {} ok, {} failed, {} removed. {}",
                passes,
                pass.succeeded,
                pass.failed,
                pass.removed,
                self.registry.summary()
            );

            if pass.cancelled {
                return RunReport {
                    passes,
                    reason: StopReason::Cancelled,
                };
            }

            if self.registry.is_empty() {
                info!("No wallets remaining. Stopping process.");
                return RunReport {
                    passes,
                    reason: StopReason::Exhausted,
                };
            }

            if self.config.max_passes.is_some_and(|max| passes >= max) {
                return RunReport {
                    passes,
                    reason: StopReason::PassLimit,
                };
            }

            info!(
                "Completed processing all {} wallets. Waiting {:.1} hours before restarting...",
                self.registry.active_count(),
                self.config.restart_delay.as_secs_f64() / 3600.0
            );
            if !self.pause(self.config.restart_delay).await {
                return RunReport {
                    passes,
                    reason: StopReason::Cancelled,
                };
            }
            info!("Restarting wallet processing cycle...");
        }
    }

    /// Process every wallet currently registered, in list order.
    ///
    /// Bounds are re-read from the live registry after every wallet. If a
    /// wallet is removed, the one that slides into its slot is next.
    pub async fn run_pass(&mut self) -> PassReport {
        let mut report = PassReport::default();
        let mut index = 0;

        while index < self.registry.active_count() {
            if self.shutdown.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let address = match self.registry.wallet_at(index) {
                Some(identity) => identity.address().to_string(),
                None => break,
            };

            info!(
                "--- Processing wallet {}/{}: {} ---",
                index + 1,
                self.registry.active_count(),
                short_address(&address)
            );

            let ok = self.processor.process(&mut self.registry, &address).await;
            report.processed += 1;
            if ok {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }

            if self.registry.contains(&address) {
                index += 1;
            } else {
                report.removed += 1;
            }

            if index < self.registry.active_count() {
                let delay = self.wallet_delay();
                info!(
                    "Waiting {:.1} seconds before processing next wallet...",
                    delay.as_secs_f64()
                );
                if !self.pause(delay).await {
                    report.cancelled = true;
                    break;
                }
            }
        }

        report
    }

    /// Uniform draw in [min, max], millisecond resolution
    fn wallet_delay(&mut self) -> Duration {
        let min = self.config.min_wallet_delay.as_millis() as u64;
        let max = self.config.max_wallet_delay.as_millis() as u64;
        if min >= max {
            return Duration::from_millis(min);
        }
        Duration::from_millis(self.rng.gen_range(min..=max))
    }

    /// Sleep unless shutdown fires first. Returns false when cancelled.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.shutdown.cancelled() => {
                warn!("Stop requested, not waiting any longer");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::error::RemoteOperation;
    use crate::processor::ProcessorConfig;
    use crate::remote::mock::{Outcome, Script, ScriptedRemote};
    use crate::wallet::{MemoryLedger, WalletIdentity, WalletState};

    const KEY_A: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const KEY_B: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";
    const KEY_C: &str = "0x0000000000000000000000000000000000000000000000000000000000000002";

    fn address(key: &str) -> String {
        WalletIdentity::from_secret(key).unwrap().address().to_string()
    }

    struct Harness {
        scheduler: Scheduler,
        remote: Arc<ScriptedRemote>,
        ledger: MemoryLedger,
        shutdown: CancellationToken,
    }

    fn harness(keys: &[&str], remote: ScriptedRemote, max_passes: Option<u32>) -> Harness {
        let ledger = MemoryLedger::new();
        let registry = WalletRegistry::with_identities(
            keys.iter().map(|k| WalletIdentity::from_secret(k).unwrap()),
            Box::new(ledger.clone()),
        );
        let remote = Arc::new(remote);
        let processor = WalletProcessor::new(remote.clone(), ProcessorConfig::default());
        let shutdown = CancellationToken::new();
        let config = SchedulerConfig {
            max_passes,
            ..Default::default()
        };
        let scheduler = Scheduler::new(registry, processor, config, shutdown.clone()).with_seed(7);
        Harness {
            scheduler,
            remote,
            ledger,
            shutdown,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_healthy_wallet() {
        let remote = ScriptedRemote::new(Script {
            ping: Outcome::Ok(Some(10)),
            ..Default::default()
        });
        let mut h = harness(&[KEY_A], remote, Some(1));

        let report = h.scheduler.run().await;
        assert_eq!(report, RunReport { passes: 1, reason: StopReason::PassLimit });

        let a = address(KEY_A);
        let registry = h.scheduler.registry();
        let status = registry.status(&a).unwrap();
        assert_eq!(status.state, WalletState::Active);
        assert_eq!(status.points, 10);
        assert_eq!(registry.error_count(&a).unwrap(), 0);
        assert_eq!(registry.active_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_activation_exhausts_registry() {
        let remote = ScriptedRemote::new(Script {
            running: Outcome::Ok(false),
            activate: Outcome::Fail("signature rejected"),
            ..Default::default()
        });
        let mut h = harness(&[KEY_A], remote, None);

        let report = h.scheduler.run().await;
        assert_eq!(report, RunReport { passes: 3, reason: StopReason::Exhausted });
        assert!(h.scheduler.registry().is_empty());

        let records = h.ledger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].address, address(KEY_A));
        assert_eq!(h.remote.call_count(RemoteOperation::Activate, &address(KEY_A)), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_failing_wallet_removed() {
        let a = address(KEY_A);
        let b = address(KEY_B);
        let remote = ScriptedRemote::new(Script {
            ping: Outcome::Ok(Some(5)),
            ..Default::default()
        })
        .with_script(
            &a,
            Script {
                ping: Outcome::Fail("internal server error"),
                ..Default::default()
            },
        );
        let mut h = harness(&[KEY_A, KEY_B], remote, Some(3));

        let report = h.scheduler.run().await;
        assert_eq!(report, RunReport { passes: 3, reason: StopReason::PassLimit });

        let registry = h.scheduler.registry();
        assert!(!registry.contains(&a));
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.status(&b).unwrap().state, WalletState::Active);
        assert_eq!(registry.error_count(&b).unwrap(), 0);
        assert_eq!(h.ledger.records().len(), 1);
        assert_eq!(h.remote.call_count(RemoteOperation::Ping, &b), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_mid_pass_does_not_skip_next() {
        let a = address(KEY_A);
        let b = address(KEY_B);
        let c = address(KEY_C);
        let remote = ScriptedRemote::new(Script::default()).with_script(
            &a,
            Script {
                running: Outcome::Fail("down"),
                ..Default::default()
            },
        );
        let mut h = harness(&[KEY_A, KEY_B, KEY_C], remote, None);
        for _ in 0..2 {
            h.scheduler.registry.record_failure(&a).unwrap();
        }

        let pass = h.scheduler.run_pass().await;
        assert_eq!(pass.processed, 3);
        assert_eq!(pass.removed, 1);
        assert_eq!(pass.succeeded, 2);
        assert_eq!(h.remote.call_count(RemoteOperation::Ping, &b), 1);
        assert_eq!(h.remote.call_count(RemoteOperation::Ping, &c), 1);
        assert_eq!(h.scheduler.registry().addresses(), &[b, c]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wallet_delays_within_bounds() {
        let remote = ScriptedRemote::new(Script::default());
        let mut h = harness(&[KEY_A, KEY_B, KEY_C], remote, Some(1));

        let started = tokio::time::Instant::now();
        h.scheduler.run().await;
        let elapsed = started.elapsed();

        // Two gaps between three wallets, none after the last one
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed <= Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_delay_between_passes() {
        let remote = ScriptedRemote::new(Script::default());
        let mut h = harness(&[KEY_A], remote, Some(2));

        let started = tokio::time::Instant::now();
        let report = h.scheduler.run().await;
        assert_eq!(report.passes, 2);
        assert!(started.elapsed() >= Duration::from_secs(5 * 60 * 60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_between_wallets() {
        let remote = ScriptedRemote::new(Script::default());
        let mut h = harness(&[KEY_A, KEY_B], remote, None);

        let shutdown = h.shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            shutdown.cancel();
        });

        let report = h.scheduler.run().await;
        assert_eq!(report, RunReport { passes: 1, reason: StopReason::Cancelled });
        // First wallet finished, second never started
        assert_eq!(h.remote.call_count(RemoteOperation::Ping, &address(KEY_A)), 1);
        assert_eq!(h.remote.call_count(RemoteOperation::NodeStatus, &address(KEY_B)), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let remote = ScriptedRemote::new(Script::default());
        let mut h = harness(&[KEY_A], remote, None);
        h.shutdown.cancel();

        let report = h.scheduler.run().await;
        assert_eq!(report, RunReport { passes: 0, reason: StopReason::Cancelled });
        assert!(h.remote.calls().is_empty());
    }

    #[test]
    fn test_wallet_delay_inclusive_range() {
        let remote = ScriptedRemote::new(Script::default());
        let mut h = harness(&[KEY_A], remote, None);
        for _ in 0..200 {
            let delay = h.scheduler.wallet_delay();
            assert!(delay >= Duration::from_secs(5));
            assert!(delay <= Duration::from_secs(10));
        }

        h.scheduler.config.max_wallet_delay = Duration::from_secs(5);
        assert_eq!(h.scheduler.wallet_delay(), Duration::from_secs(5));
    }
}

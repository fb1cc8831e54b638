use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use portfolio_core::{CoreError, PortfolioStore};

use crate::engine::{CompletionGateway, Prompt};
use crate::error::BatchError;
use crate::{parse, prompt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOptions {
    pub app_batches: usize,
    pub integration_batches: usize,
    pub batch_size: usize,
    /// Wait after each saved application batch, to stay under provider rate limits.
    pub pause: Duration,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            app_batches: 4,
            integration_batches: 4,
            batch_size: 10,
            pause: Duration::from_secs(1),
        }
    }
}

/// Outcome of a seeding run. Partial success is normal.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub applications: usize,
    pub integrations: usize,
    pub failed_batches: usize,
    pub skipped_records: usize,
}

/// Wipes the store and fills it with generated sample applications and
/// integrations.
pub struct Seeder {
    gateway: Arc<dyn CompletionGateway>,
    options: SeedOptions,
}

impl Seeder {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            gateway,
            options: SeedOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SeedOptions) -> Self {
        self.options = options;
        self
    }

    /// Only store write failures abort the run; batch and record failures are
    /// logged, counted, and skipped.
    pub async fn run<S: PortfolioStore>(&self, store: &mut S) -> Result<SeedReport, CoreError> {
        info!("wiping existing data");
        store.modify(|p| {
            p.clear_integrations();
            p.clear_applications();
            Ok(())
        })?;

        let mut report = SeedReport::default();
        self.seed_applications(store, &mut report).await?;
        self.seed_integrations(store, &mut report).await?;

        let p = store.portfolio();
        report.applications = p.applications.len();
        report.integrations = p.integrations.len();
        info!(
            applications = report.applications,
            integrations = report.integrations,
            failed_batches = report.failed_batches,
            skipped_records = report.skipped_records,
            "seeding finished"
        );
        Ok(report)
    }

    async fn fetch_batch(&self, prompt: &Prompt) -> Result<Vec<Value>, BatchError> {
        let raw = self.gateway.complete(prompt).await?;
        parse::parse_batch(&raw)
    }

    async fn seed_applications<S: PortfolioStore>(
        &self,
        store: &mut S,
        report: &mut SeedReport,
    ) -> Result<(), CoreError> {
        let total = self.options.app_batches;
        info!(
            expected = total * self.options.batch_size,
            "generating applications"
        );

        for batch in 1..=total {
            info!(batch, total, "processing application batch");
            let records = match self
                .fetch_batch(&prompt::seed_applications(self.options.batch_size))
                .await
            {
                Ok(records) => records,
                Err(e) => {
                    warn!(batch, error = %e, "application batch failed");
                    report.failed_batches += 1;
                    continue;
                }
            };

            let mut saved = 0;
            for record in records {
                let data = match parse::application_record(record) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!(batch, error = %e, "skipping malformed application");
                        report.skipped_records += 1;
                        continue;
                    }
                };
                match store.modify(|p| p.create_application(data)) {
                    Ok(_) => saved += 1,
                    Err(CoreError::Validation(msg)) => {
                        warn!(batch, %msg, "skipping invalid application");
                        report.skipped_records += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
            info!(batch, saved, "application batch saved");

            if !self.options.pause.is_zero() {
                tokio::time::sleep(self.options.pause).await;
            }
        }
        Ok(())
    }

    async fn seed_integrations<S: PortfolioStore>(
        &self,
        store: &mut S,
        report: &mut SeedReport,
    ) -> Result<(), CoreError> {
        let total = self.options.integration_batches;
        info!(
            expected = total * self.options.batch_size,
            "generating integrations"
        );

        for batch in 1..=total {
            // re-read each time so later batches see every saved application
            let names = store.portfolio().application_names();
            if names.is_empty() {
                info!("no applications to link, stopping");
                break;
            }

            let records = match self
                .fetch_batch(&prompt::seed_integrations(self.options.batch_size, &names))
                .await
            {
                Ok(records) => records,
                Err(e) => {
                    warn!(batch, error = %e, "integration batch failed");
                    report.failed_batches += 1;
                    continue;
                }
            };

            let mut saved = 0;
            for record in records {
                let rec = match parse::integration_record(record) {
                    Ok(rec) => rec,
                    Err(e) => {
                        debug!(batch, error = %e, "skipping malformed integration");
                        report.skipped_records += 1;
                        continue;
                    }
                };
                let p = store.portfolio();
                let endpoints = p
                    .application_by_name(&rec.source_app_name)
                    .zip(p.application_by_name(&rec.target_app_name))
                    .map(|(s, t)| (s.id, t.id));
                let Some((source, target)) = endpoints else {
                    debug!(
                        batch,
                        source_app = %rec.source_app_name,
                        target_app = %rec.target_app_name,
                        "skipping integration with unknown application"
                    );
                    report.skipped_records += 1;
                    continue;
                };
                store.modify(|p| p.create_integration(source, target, rec.data()))?;
                saved += 1;
            }
            info!(batch, total, saved, "integration batch completed");
        }
        Ok(())
    }
}

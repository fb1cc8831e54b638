use serde::Serialize;
use std::collections::BTreeMap;

use crate::{Criticality, Portfolio};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

/// Headline numbers for the dashboard view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub total_apps: usize,
    pub critical_apps: usize,
    pub medium_apps: usize,
    pub low_apps: usize,
    pub cloud_apps: usize,
    /// Share of cloud-hosted apps, rounded down. Zero for an empty portfolio.
    pub cloud_percentage: u32,
    pub integrations_count: usize,
    /// Sorted by domain name.
    pub domains: Vec<DomainCount>,
}

impl PortfolioStats {
    pub fn compute(portfolio: &Portfolio) -> Self {
        let apps = &portfolio.applications;
        let count_of = |c: Criticality| apps.iter().filter(|a| a.data.criticality == c).count();

        let total_apps = apps.len();
        let cloud_apps = apps.iter().filter(|a| a.data.is_cloud_hosted()).count();
        let cloud_percentage = if total_apps > 0 {
            (cloud_apps * 100 / total_apps) as u32
        } else {
            0
        };

        let mut by_domain: BTreeMap<&str, usize> = BTreeMap::new();
        for app in apps {
            *by_domain.entry(app.data.domain.as_str()).or_default() += 1;
        }

        Self {
            total_apps,
            critical_apps: count_of(Criticality::High),
            medium_apps: count_of(Criticality::Medium),
            low_apps: count_of(Criticality::Low),
            cloud_apps,
            cloud_percentage,
            integrations_count: portfolio.integrations.len(),
            domains: by_domain
                .into_iter()
                .map(|(domain, count)| DomainCount {
                    domain: domain.to_string(),
                    count,
                })
                .collect(),
        }
    }
}

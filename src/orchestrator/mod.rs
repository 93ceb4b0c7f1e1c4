use crate::{
    abi::{
        classify,
        Abi,
        FunctionDescriptor,
    },
    cache::{
        CacheEntry,
        CacheRepository,
        CacheSession,
        UNKNOWN_CONTRACT,
    },
    explorer::{
        ExplorerGateway,
        ExplorerTransport,
    },
    loupe::DiamondLoupe,
    primitives::{
        Address,
        Facet,
        MethodClassification,
    },
    InspectorError,
};

use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::BTreeMap,
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{
    info,
    warn,
};

/// What to do with a facet whose name or ABI could not be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingDataPolicy {
    /// Keep the facet under a synthesized name with whatever methods resolved.
    #[default]
    Placeholder,
    /// Leave the facet out of the report.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Pause between two facets, keeps the run under the explorer's rate limit.
    pub throttle: Duration,
    pub on_missing_data: MissingDataPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(600),
            on_missing_data: MissingDataPolicy::default(),
        }
    }
}

/// Lookup tables produced by one orchestration run, keyed by facet address.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetReport {
    pub method_names_lookup: BTreeMap<Address, MethodClassification>,
    pub facet_names_lookup: BTreeMap<Address, String>,
    pub facet_abis: BTreeMap<Address, Abi>,
}

impl FacetReport {
    pub fn contains(&self, address: &Address) -> bool {
        self.facet_names_lookup.contains_key(address)
    }

    pub fn name_of(&self, address: &Address) -> Option<&str> {
        self.facet_names_lookup.get(address).map(String::as_str)
    }

    pub fn methods_of(&self, address: &Address) -> Option<&MethodClassification> {
        self.method_names_lookup.get(address)
    }

    /// Finds `method`, a name or `0x` selector, in the resolved facet ABIs.
    pub fn resolve_method(&self, method: &str) -> Option<(Address, FunctionDescriptor)> {
        self.facet_abis.iter().find_map(|(address, abi)| {
            abi.resolve_method(method)
                .ok()
                .map(|function| (*address, function))
        })
    }
}

/// Facets of a diamond together with what was resolved about them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub facets: Vec<Facet>,
    pub report: FacetReport,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Facet processing was cancelled")]
    Cancelled,
}

/// Resolves names, ABIs and method classifications for every facet of a
/// diamond, one facet at a time.
#[derive(Debug)]
pub struct FacetOrchestrator<T, R> {
    gateway: ExplorerGateway<T>,
    cache: CacheSession<R>,
    config: OrchestratorConfig,
}

impl<T: ExplorerTransport, R: CacheRepository> FacetOrchestrator<T, R> {
    pub fn new(gateway: ExplorerGateway<T>, cache: CacheSession<R>, config: OrchestratorConfig) -> Self {
        Self {
            gateway,
            cache,
            config,
        }
    }

    pub fn gateway(&self) -> &ExplorerGateway<T> {
        &self.gateway
    }

    pub fn cache(&self) -> &CacheSession<R> {
        &self.cache
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Reads the facets through `loupe` and processes them.
    pub async fn inspect<L: DiamondLoupe>(
        &mut self,
        loupe: &L,
        token: &CancellationToken,
    ) -> Result<Inspection, InspectorError> {
        let facets = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(OrchestratorError::Cancelled.into()),
            facets = loupe.facets() => facets?,
        };
        let report = self.process_facets(&facets, token).await?;
        Ok(Inspection { facets, report })
    }

    /// Processes `facets` in order. A facet that fails to resolve never aborts
    /// the batch, how it is reported depends on
    /// [`OrchestratorConfig::on_missing_data`].
    ///
    /// Only cancellation makes the run fail; partial results are discarded then.
    pub async fn process_facets(
        &mut self,
        facets: &[Facet],
        token: &CancellationToken,
    ) -> Result<FacetReport, OrchestratorError> {
        let mut report = FacetReport::default();

        for (index, facet) in facets.iter().enumerate() {
            if index > 0 && !self.config.throttle.is_zero() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(OrchestratorError::Cancelled),
                    _ = tokio::time::sleep(self.config.throttle) => {}
                }
            }
            if token.is_cancelled() {
                return Err(OrchestratorError::Cancelled);
            }

            self.process_facet(facet, token, &mut report).await;
        }

        if token.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }

        info!(
            target: "diamond-inspector::orchestrator",
            facets = facets.len(),
            reported = report.facet_names_lookup.len(),
            "Processed facets"
        );

        Ok(report)
    }

    async fn process_facet(&mut self, facet: &Facet, token: &CancellationToken, report: &mut FacetReport) {
        let address = facet.address;
        info!(target: "diamond-inspector::orchestrator", ?address, "Processing facet");

        let name = self
            .gateway
            .fetch_contract_name(address, &mut self.cache, token)
            .await;
        let unresolved = name.is_fallback() || name.value == UNKNOWN_CONTRACT;
        if unresolved && self.config.on_missing_data == MissingDataPolicy::Skip {
            warn!(
                target: "diamond-inspector::orchestrator",
                ?address,
                "Skipping facet without a resolved contract name"
            );
            return;
        }

        let Some(abi) = self.gateway.fetch_abi(address, &mut self.cache, token).await else {
            if self.config.on_missing_data == MissingDataPolicy::Skip {
                warn!(
                    target: "diamond-inspector::orchestrator",
                    ?address,
                    "Skipping facet without an ABI"
                );
                return;
            }

            warn!(
                target: "diamond-inspector::orchestrator",
                ?address,
                "No ABI for facet, reporting it without methods"
            );
            report.facet_names_lookup.insert(address, name.value);
            report
                .method_names_lookup
                .insert(address, MethodClassification::default());
            return;
        };

        let methods = classify(&abi, &facet.selectors);
        self.cache.update(|record| {
            record
                .method_names
                .insert(address, CacheEntry::resolved(methods.clone()));
        });

        report.facet_names_lookup.insert(address, name.value);
        report.method_names_lookup.insert(address, methods);
        report.facet_abis.insert(address, abi);
    }
}

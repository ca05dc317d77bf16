//! Selector generator with tier fallback orchestration

use tracing::{debug, info, warn};
use variant_page_dom::{Document, NodeId};

use crate::strategies::{strategy_for, AbsoluteStrategy, GenerationContext, Strategy};
use crate::types::{GeneratedSelector, SelectorPolicy, SelectorTier};

/// Turns an element into a selector that, at generation time, matches that
/// element and nothing else.
///
/// Generation never fails: when every verified tier is exhausted the
/// absolute `nth-of-type` chain is returned and logged as degraded. Output is
/// deterministic for a fixed page.
pub struct SelectorGenerator {
    policy: SelectorPolicy,
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for SelectorGenerator {
    fn default() -> Self {
        Self::new(SelectorPolicy::default())
    }
}

impl SelectorGenerator {
    pub fn new(policy: SelectorPolicy) -> Self {
        let strategies = SelectorTier::fallback_chain()
            .into_iter()
            .map(strategy_for)
            .collect();
        Self { policy, strategies }
    }

    pub fn policy(&self) -> &SelectorPolicy {
        &self.policy
    }

    /// Selector string for `node`; empty for non-elements.
    pub fn generate(&self, doc: &Document, node: NodeId) -> String {
        self.generate_detailed(doc, node)
            .map(|generated| generated.selector)
            .unwrap_or_default()
    }

    /// Selector plus the tier that produced it.
    pub fn generate_detailed(&self, doc: &Document, node: NodeId) -> Option<GeneratedSelector> {
        if !doc.is_element(node) {
            debug!(%node, "selector requested for a non-element");
            return None;
        }

        if !doc.is_connected(node) {
            let selector = AbsoluteStrategy::chain(doc, node);
            warn!(%node, selector = %selector, "element is detached; returning unverified path");
            return Some(GeneratedSelector {
                selector,
                tier: SelectorTier::Absolute,
                verified: false,
            });
        }

        let ctx = GenerationContext::new(doc, &self.policy);
        for strategy in &self.strategies {
            match strategy.generate(&ctx, node) {
                Ok(selector) => {
                    let tier = strategy.tier();
                    debug!(%node, tier = tier.name(), selector = %selector, "selector generated");
                    return Some(GeneratedSelector {
                        selector,
                        verified: !tier.is_degraded(),
                        tier,
                    });
                }
                Err(err) => {
                    debug!(%node, tier = strategy.name(), error = %err, "tier rejected");
                }
            }
        }

        // The absolute tier always answers, so this only runs for an empty chain.
        info!(%node, "no strategy produced a selector");
        None
    }

    /// Re-check a selector against the page: exactly one match, equal to `node`.
    pub fn is_unique(&self, doc: &Document, selector: &str, node: NodeId) -> bool {
        GenerationContext::new(doc, &self.policy)
            .verify(selector, node)
            .is_ok()
    }
}

/// Convenience wrapper using the default policy.
pub fn generate_selector(doc: &Document, node: NodeId) -> String {
    SelectorGenerator::default().generate(doc, node)
}

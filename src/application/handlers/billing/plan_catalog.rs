//! PlanCatalogManager - Finds or creates the subscription plan and its variations.
//!
//! Lookups are by deterministic name, so repeated calls reuse what an earlier
//! call created. Processor errors surface unmodified; nothing is retried.

use std::sync::Arc;

use crate::domain::billing::{BillingError, IdempotencyKey, PlanType, PLAN_NAME};
use crate::domain::foundation::{PlanId, PlanVariationId};
use crate::ports::{
    CatalogObject, CatalogObjectDraft, CatalogObjectKind, PaymentProcessor, PricingPhase,
    UpsertCatalogObjectRequest,
};

const CATALOG_SCOPE: &str = "catalog";

/// Manages the processor-side plan catalog.
pub struct PlanCatalogManager {
    processor: Arc<dyn PaymentProcessor>,
}

impl PlanCatalogManager {
    pub fn new(processor: Arc<dyn PaymentProcessor>) -> Self {
        Self { processor }
    }

    /// The `stories_subscription` plan: one single-period phase per cadence
    /// at the base price. Only a plan's last phase may be open-ended.
    pub fn plan_draft() -> CatalogObjectDraft {
        CatalogObjectDraft::Plan {
            name: PLAN_NAME.to_string(),
            phases: PlanType::ALL
                .iter()
                .map(|plan_type| PricingPhase {
                    plan_type: *plan_type,
                    periods: Some(1),
                    price_cents: plan_type.base_price_cents(),
                })
                .collect(),
        }
    }

    /// Returns the id of the `stories_subscription` plan, creating it if absent.
    pub async fn ensure_plan(&self) -> Result<PlanId, BillingError> {
        let existing = self
            .find(CatalogObjectKind::SubscriptionPlan, |o| o.name == PLAN_NAME)
            .await?;

        let object = match existing {
            Some(object) => object,
            None => {
                let created = self
                    .processor
                    .upsert_catalog_object(UpsertCatalogObjectRequest {
                        idempotency_key: IdempotencyKey::derive(
                            CATALOG_SCOPE,
                            "create_plan",
                            PLAN_NAME,
                        ),
                        object: Self::plan_draft(),
                    })
                    .await?;
                tracing::info!(plan_id = %created.id, "Created subscription plan");
                created
            }
        };

        PlanId::new(object.id)
            .map_err(|_| BillingError::unexpected_response("Plan without id"))
    }

    /// Returns the id of the variation for `plan_type` under `plan_id`,
    /// creating it if absent.
    pub async fn ensure_variation(
        &self,
        plan_id: &PlanId,
        plan_type: PlanType,
    ) -> Result<PlanVariationId, BillingError> {
        let name = plan_type.variation_name();
        let existing = self
            .find(CatalogObjectKind::SubscriptionPlanVariation, |o| {
                o.name == name && o.plan_id.as_deref() == Some(plan_id.as_str())
            })
            .await?;

        let object = match existing {
            Some(object) => object,
            None => {
                let created = self
                    .processor
                    .upsert_catalog_object(UpsertCatalogObjectRequest {
                        idempotency_key: IdempotencyKey::derive(
                            CATALOG_SCOPE,
                            "create_variation",
                            &format!("{}/{}", plan_id, name),
                        ),
                        object: CatalogObjectDraft::Variation {
                            plan_id: plan_id.clone(),
                            name: name.clone(),
                            phase: PricingPhase {
                                plan_type,
                                periods: Some(plan_type.periods()),
                                price_cents: plan_type.base_price_cents(),
                            },
                        },
                    })
                    .await?;
                tracing::info!(
                    plan_id = %plan_id,
                    variation_id = %created.id,
                    cadence = %plan_type,
                    "Created subscription plan variation"
                );
                created
            }
        };

        PlanVariationId::new(object.id)
            .map_err(|_| BillingError::unexpected_response("Plan variation without id"))
    }

    /// First object of `kind` matching `predicate`, across all pages.
    async fn find<F>(
        &self,
        kind: CatalogObjectKind,
        predicate: F,
    ) -> Result<Option<CatalogObject>, BillingError>
    where
        F: Fn(&CatalogObject) -> bool + Send,
    {
        let mut cursor = None;
        loop {
            let page = self.processor.list_catalog(kind, cursor).await?;
            if let Some(found) = page.objects.into_iter().find(|o| predicate(o)) {
                return Ok(Some(found));
            }
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(None),
            }
        }
    }
}

//! # Invalidation Coordinator
//!
//! Given a domain mutation, computes the exact, finite set of concrete
//! cache keys that are now stale and removes them through the cache
//! service, synchronously, before the mutation's handler returns to its
//! caller.
//!
//! Only directly derivable keys are removed. Aggregate and listing caches
//! (upcoming, trending, search, filtered) have an unbounded historical
//! parameter space that cannot be enumerated, so they expire by TTL alone;
//! their staleness is bounded by one TTL window per concept. The wildcard
//! patterns reported by [`InvalidationCoordinator::ttl_scope`] describe
//! that passive scope for operators and are never used for backend scans.

use crate::catalog::{CacheKey, WildcardPattern};
use crate::service::CacheService;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Domain mutations that trigger cache invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEvent {
    /// A review was created for a show
    ReviewCreated { show_id: Uuid },

    /// A pending review was approved
    ReviewApproved { show_id: Uuid },

    /// A pending review was rejected
    ReviewRejected { show_id: Uuid },

    /// A show was created, updated, or retired
    ShowChanged { show_id: Uuid },

    /// A theatre was created, updated, or retired
    TheatreChanged,

    /// A user added or removed a favorite
    FavoritesChanged { user_id: Uuid },
}

/// Result of one invalidation call.
///
/// Invalidation is best-effort: the call reports success to its caller
/// even when individual removals failed, because the TTL backstop bounds
/// the staleness either way. `removed` may be lower than `resolved` when
/// entries were absent or a removal failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidationOutcome {
    /// Concrete keys resolved for the event
    pub resolved: usize,

    /// Keys confirmed removed from the store
    pub removed: usize,
}

/// Coordinates cache invalidation for domain mutations
pub struct InvalidationCoordinator {
    cache: Arc<CacheService>,
}

impl InvalidationCoordinator {
    pub fn new(cache: Arc<CacheService>) -> Self {
        Self { cache }
    }

    /// Resolve the concrete keys invalidated by an event.
    ///
    /// Pure template expansion over the key catalog; deterministic for a
    /// given event.
    pub fn resolve_keys(&self, event: MutationEvent) -> Vec<CacheKey> {
        let catalog = self.cache.catalog();

        match event {
            // Any review change affects the show's detail (embedded rating
            // and review count) and its review listing.
            MutationEvent::ReviewCreated { show_id }
            | MutationEvent::ReviewApproved { show_id }
            | MutationEvent::ReviewRejected { show_id } => {
                vec![catalog.show_detail(show_id), catalog.reviews_for_show(show_id)]
            }

            MutationEvent::ShowChanged { show_id } => {
                vec![catalog.show_detail(show_id), catalog.shows_active()]
            }

            MutationEvent::TheatreChanged => vec![catalog.theatres_all()],

            MutationEvent::FavoritesChanged { user_id } => {
                vec![catalog.user_favorites(user_id)]
            }
        }
    }

    /// Wildcard scope of the caches an event leaves to TTL expiry.
    ///
    /// Reported for logging and operator visibility only.
    pub fn ttl_scope(&self, event: MutationEvent) -> &'static [WildcardPattern] {
        match event {
            MutationEvent::ReviewCreated { .. }
            | MutationEvent::ReviewApproved { .. }
            | MutationEvent::ReviewRejected { .. } => {
                // Trending and filtered listings embed rating data.
                &[WildcardPattern::SHOWS]
            }
            MutationEvent::ShowChanged { .. } => {
                &[WildcardPattern::SHOWS, WildcardPattern::REVIEWS]
            }
            MutationEvent::TheatreChanged => {
                &[WildcardPattern::THEATRES, WildcardPattern::SHOWS]
            }
            MutationEvent::FavoritesChanged { .. } => &[WildcardPattern::USERS],
        }
    }

    /// Invalidate the caches affected by a mutation.
    ///
    /// Removals are independent: a failed removal is logged inside the
    /// service and does not block the others. Always returns normally.
    pub async fn invalidate(&self, event: MutationEvent) -> InvalidationOutcome {
        if !self.cache.enabled() {
            return InvalidationOutcome {
                resolved: 0,
                removed: 0,
            };
        }

        let keys = self.resolve_keys(event);
        debug!(
            "Invalidating {} key(s) for {:?}; TTL-bounded scope: {:?}",
            keys.len(),
            event,
            self.ttl_scope(event)
        );

        let removed = self.cache.remove_matching(&keys).await;

        InvalidationOutcome {
            resolved: keys.len(),
            removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use std::time::Duration;

    async fn setup() -> (Arc<CacheService>, InvalidationCoordinator) {
        let cache = Arc::new(CacheService::new(CacheConfig::default()).await.unwrap());
        let coordinator = InvalidationCoordinator::new(cache.clone());
        (cache, coordinator)
    }

    #[tokio::test]
    async fn review_events_resolve_detail_and_reviews_keys() {
        let (cache, coordinator) = setup().await;
        let show_id = Uuid::new_v4();

        for event in [
            MutationEvent::ReviewCreated { show_id },
            MutationEvent::ReviewApproved { show_id },
            MutationEvent::ReviewRejected { show_id },
        ] {
            let keys = coordinator.resolve_keys(event);
            assert_eq!(
                keys,
                vec![
                    cache.catalog().show_detail(show_id),
                    cache.catalog().reviews_for_show(show_id),
                ]
            );
        }
    }

    #[tokio::test]
    async fn review_approval_removes_exactly_the_affected_keys() {
        let (cache, coordinator) = setup().await;
        let show_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();

        let detail = cache.catalog().show_detail(show_id);
        let reviews = cache.catalog().reviews_for_show(show_id);
        let unrelated = cache.catalog().show_detail(other_id);

        let ttl = Some(Duration::from_secs(600));
        cache.set(&detail, &"detail payload", ttl).await;
        cache.set(&reviews, &"reviews payload", ttl).await;
        cache.set(&unrelated, &"other payload", ttl).await;

        let outcome = coordinator
            .invalidate(MutationEvent::ReviewApproved { show_id })
            .await;
        assert_eq!(outcome, InvalidationOutcome { resolved: 2, removed: 2 });

        let detail_after: Option<String> = cache.get(&detail).await;
        let reviews_after: Option<String> = cache.get(&reviews).await;
        let unrelated_after: Option<String> = cache.get(&unrelated).await;
        assert_eq!(detail_after, None);
        assert_eq!(reviews_after, None);
        assert_eq!(unrelated_after, Some("other payload".to_string()));
    }

    #[tokio::test]
    async fn invalidating_absent_entries_still_succeeds() {
        let (_cache, coordinator) = setup().await;

        let outcome = coordinator
            .invalidate(MutationEvent::ShowChanged {
                show_id: Uuid::new_v4(),
            })
            .await;
        assert_eq!(outcome.resolved, 2);
        assert_eq!(outcome.removed, 0);
    }

    #[tokio::test]
    async fn aggregate_listings_are_left_to_ttl() {
        let (cache, coordinator) = setup().await;
        let show_id = Uuid::new_v4();

        let trending = cache.catalog().shows_trending(10);
        let upcoming = cache.catalog().shows_upcoming(7);
        let ttl = Some(Duration::from_secs(600));
        cache.set(&trending, &"trending payload", ttl).await;
        cache.set(&upcoming, &"upcoming payload", ttl).await;

        coordinator
            .invalidate(MutationEvent::ReviewApproved { show_id })
            .await;

        // Listing caches stay live until their TTL window closes; the
        // event reports them under its wildcard scope instead.
        let trending_after: Option<String> = cache.get(&trending).await;
        let upcoming_after: Option<String> = cache.get(&upcoming).await;
        assert_eq!(trending_after, Some("trending payload".to_string()));
        assert_eq!(upcoming_after, Some("upcoming payload".to_string()));

        let scope = coordinator.ttl_scope(MutationEvent::ReviewApproved { show_id });
        assert!(scope.iter().any(|pattern| pattern.matches(&trending)));
    }

    #[tokio::test]
    async fn theatre_and_favorites_events() {
        let (cache, coordinator) = setup().await;
        let user_id = Uuid::new_v4();

        assert_eq!(
            coordinator.resolve_keys(MutationEvent::TheatreChanged),
            vec![cache.catalog().theatres_all()]
        );
        assert_eq!(
            coordinator.resolve_keys(MutationEvent::FavoritesChanged { user_id }),
            vec![cache.catalog().user_favorites(user_id)]
        );
    }

    #[tokio::test]
    async fn disabled_cache_skips_invalidation() {
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let cache = Arc::new(CacheService::new(config).await.unwrap());
        let coordinator = InvalidationCoordinator::new(cache);

        let outcome = coordinator
            .invalidate(MutationEvent::TheatreChanged)
            .await;
        assert_eq!(outcome, InvalidationOutcome { resolved: 0, removed: 0 });
    }
}

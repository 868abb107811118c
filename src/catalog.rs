//! # Key Catalog
//!
//! Single source of truth mapping each cache concept to its key template
//! and default TTL. Callers never hand-assemble key strings; every concrete
//! key is produced by template expansion here, so the same concept and
//! parameters always yield a byte-identical key.

use crate::config::TtlConfig;
use crate::error::{CacheError, CacheResult};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Logical cache concepts registered in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheConcept {
    /// All active theatres
    TheatresAll,
    /// All active shows
    ShowsActive,
    /// Upcoming shows within a day window
    ShowsUpcoming,
    /// Most viewed shows
    ShowsTrending,
    /// Single show detail with reviews
    ShowDetail,
    /// Show search results by keyword
    ShowsSearch,
    /// Filtered show listings by filter hash
    ShowsFiltered,
    /// Approved reviews for a show
    ReviewsForShow,
    /// User favorites
    UserFavorites,
}

impl CacheConcept {
    /// All registered concepts
    pub const ALL: [CacheConcept; 9] = [
        CacheConcept::TheatresAll,
        CacheConcept::ShowsActive,
        CacheConcept::ShowsUpcoming,
        CacheConcept::ShowsTrending,
        CacheConcept::ShowDetail,
        CacheConcept::ShowsSearch,
        CacheConcept::ShowsFiltered,
        CacheConcept::ReviewsForShow,
        CacheConcept::UserFavorites,
    ];

    /// Stable concept name, usable in configuration and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            CacheConcept::TheatresAll => "theatres-all",
            CacheConcept::ShowsActive => "shows-active",
            CacheConcept::ShowsUpcoming => "shows-upcoming-by-days",
            CacheConcept::ShowsTrending => "shows-trending-by-count",
            CacheConcept::ShowDetail => "show-detail-by-id",
            CacheConcept::ShowsSearch => "shows-search-by-keyword",
            CacheConcept::ShowsFiltered => "shows-filtered-by-hash",
            CacheConcept::ReviewsForShow => "reviews-by-show",
            CacheConcept::UserFavorites => "user-favorites-by-user",
        }
    }
}

impl FromStr for CacheConcept {
    type Err = CacheError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        CacheConcept::ALL
            .iter()
            .find(|c| c.name() == name)
            .copied()
            .ok_or_else(|| CacheError::UnknownConcept {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for CacheConcept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete cache key produced by template expansion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A key template: a format string with positional placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTemplate {
    /// Pattern with `{0}`-style positional placeholders
    pub pattern: &'static str,

    /// Number of parameters the pattern expects
    pub placeholders: usize,
}

impl KeyTemplate {
    /// Expand the template with the given parameters.
    ///
    /// Deterministic: identical parameters always produce a byte-identical
    /// key. Fails only on placeholder-arity mismatch, which is a programmer
    /// error rather than a runtime condition.
    pub fn expand(&self, params: &[&str]) -> CacheResult<CacheKey> {
        if params.len() != self.placeholders {
            return Err(CacheError::KeyExpansion {
                pattern: self.pattern,
                expected: self.placeholders,
                got: params.len(),
            });
        }

        let mut key = self.pattern.to_string();
        for (index, param) in params.iter().enumerate() {
            key = key.replace(&format!("{{{}}}", index), param);
        }

        Ok(CacheKey(key))
    }
}

/// A wildcard prefix pattern describing the scope of an invalidation.
///
/// Used only for diagnostics and operator-facing logs. Invalidation never
/// depends on the backend being able to scan by prefix; aggregate caches
/// expire by TTL instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WildcardPattern(pub &'static str);

impl WildcardPattern {
    /// Theatre-related caches
    pub const THEATRES: WildcardPattern = WildcardPattern("theatres:*");
    /// Show-related caches
    pub const SHOWS: WildcardPattern = WildcardPattern("shows:*");
    /// Review-related caches
    pub const REVIEWS: WildcardPattern = WildcardPattern("reviews:*");
    /// User-related caches
    pub const USERS: WildcardPattern = WildcardPattern("users:*");

    /// Whether a concrete key falls under this pattern
    pub fn matches(&self, key: &CacheKey) -> bool {
        key.as_str().starts_with(self.0.trim_end_matches('*'))
    }
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// The static registry of key templates and their TTL policy.
///
/// Templates are fixed for the process lifetime; TTLs come from the
/// immutable configuration snapshot taken at startup.
#[derive(Debug, Clone)]
pub struct KeyCatalog {
    ttl: TtlConfig,
}

impl KeyCatalog {
    pub fn new(ttl: TtlConfig) -> Self {
        Self { ttl }
    }

    /// Template for a concept
    pub fn template(&self, concept: CacheConcept) -> KeyTemplate {
        match concept {
            CacheConcept::TheatresAll => KeyTemplate {
                pattern: "theatres:all",
                placeholders: 0,
            },
            CacheConcept::ShowsActive => KeyTemplate {
                pattern: "shows:active",
                placeholders: 0,
            },
            CacheConcept::ShowsUpcoming => KeyTemplate {
                pattern: "shows:upcoming:{0}",
                placeholders: 1,
            },
            CacheConcept::ShowsTrending => KeyTemplate {
                pattern: "shows:trending:{0}",
                placeholders: 1,
            },
            CacheConcept::ShowDetail => KeyTemplate {
                pattern: "shows:detail:{0}",
                placeholders: 1,
            },
            CacheConcept::ShowsSearch => KeyTemplate {
                pattern: "shows:search:{0}",
                placeholders: 1,
            },
            CacheConcept::ShowsFiltered => KeyTemplate {
                pattern: "shows:filtered:{0}",
                placeholders: 1,
            },
            CacheConcept::ReviewsForShow => KeyTemplate {
                pattern: "reviews:show:{0}",
                placeholders: 1,
            },
            CacheConcept::UserFavorites => KeyTemplate {
                pattern: "users:favorites:{0}",
                placeholders: 1,
            },
        }
    }

    /// Default TTL for a concept, from the startup configuration
    pub fn ttl(&self, concept: CacheConcept) -> Duration {
        let minutes = match concept {
            CacheConcept::TheatresAll => self.ttl.theatres_ttl_minutes,
            CacheConcept::ShowsActive => self.ttl.all_shows_ttl_minutes,
            CacheConcept::ShowsUpcoming => self.ttl.upcoming_shows_ttl_minutes,
            CacheConcept::ShowsTrending => self.ttl.trending_shows_ttl_minutes,
            CacheConcept::ShowDetail => self.ttl.show_detail_ttl_minutes,
            CacheConcept::ShowsSearch => self.ttl.search_results_ttl_minutes,
            CacheConcept::ShowsFiltered => self.ttl.filtered_shows_ttl_minutes,
            CacheConcept::ReviewsForShow => self.ttl.reviews_ttl_minutes,
            CacheConcept::UserFavorites => self.ttl.user_favorites_ttl_minutes,
        };
        Duration::from_secs(minutes * 60)
    }

    /// Expand a concept's template with string parameters
    pub fn expand(&self, concept: CacheConcept, params: &[&str]) -> CacheResult<CacheKey> {
        self.template(concept).expand(params)
    }

    // Typed helpers for the concrete keys mutation and query handlers use.
    // Zero- and one-parameter expansions below cannot fail arity checks.

    pub fn theatres_all(&self) -> CacheKey {
        self.must_expand(CacheConcept::TheatresAll, &[])
    }

    pub fn shows_active(&self) -> CacheKey {
        self.must_expand(CacheConcept::ShowsActive, &[])
    }

    pub fn shows_upcoming(&self, days: u32) -> CacheKey {
        self.must_expand(CacheConcept::ShowsUpcoming, &[&days.to_string()])
    }

    pub fn shows_trending(&self, count: u32) -> CacheKey {
        self.must_expand(CacheConcept::ShowsTrending, &[&count.to_string()])
    }

    pub fn show_detail(&self, show_id: Uuid) -> CacheKey {
        self.must_expand(CacheConcept::ShowDetail, &[&show_id.to_string()])
    }

    pub fn shows_search(&self, keyword: &str) -> CacheKey {
        self.must_expand(CacheConcept::ShowsSearch, &[keyword])
    }

    pub fn shows_filtered(&self, filter_hash: &str) -> CacheKey {
        self.must_expand(CacheConcept::ShowsFiltered, &[filter_hash])
    }

    pub fn reviews_for_show(&self, show_id: Uuid) -> CacheKey {
        self.must_expand(CacheConcept::ReviewsForShow, &[&show_id.to_string()])
    }

    pub fn user_favorites(&self, user_id: Uuid) -> CacheKey {
        self.must_expand(CacheConcept::UserFavorites, &[&user_id.to_string()])
    }

    fn must_expand(&self, concept: CacheConcept, params: &[&str]) -> CacheKey {
        match self.expand(concept, params) {
            Ok(key) => key,
            // Unreachable: the typed helpers pass the exact arity.
            Err(e) => unreachable!("static template expansion failed: {}", e),
        }
    }
}

use courier_core::{
    Capabilities, HandlerResult, Intercept, Next, Outcome, Request, RequestContext, ResponseCache,
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Expiration used when neither the request nor the configuration sets one.
pub const DEFAULT_CACHE_EXPIRATION: Duration = Duration::from_secs(5 * 60);

/// Serves successful responses from a cache.
///
/// Applies to requests declaring [`Capabilities::CACHEABLE`] whose
/// [`Request::cache_key`] is `Some`. Entries are keyed by the request type
/// and the request's key. A hit short-circuits with a clone of the cached
/// response; a miss runs the inner chain and stores the response if it
/// succeeded. Failures are never cached.
#[derive(Debug, Clone, Default)]
pub struct Caching<C> {
    cache: C,
    default_expiration: Option<Duration>,
}

impl<C> Caching<C> {
    /// Cache responses in `cache`.
    pub fn new(cache: C) -> Self {
        Self {
            cache,
            default_expiration: None,
        }
    }

    /// Expiration for requests that do not set their own.
    pub fn with_default_expiration(mut self, expiration: Duration) -> Self {
        self.default_expiration = Some(expiration);
        self
    }

    /// The expiration applied to requests that do not set their own.
    pub fn default_expiration(&self) -> Duration {
        self.default_expiration.unwrap_or(DEFAULT_CACHE_EXPIRATION)
    }

    /// The underlying cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }
}

impl<C: ResponseCache> Intercept for Caching<C> {
    fn name(&self) -> &'static str {
        "caching"
    }

    fn applies_to(&self, capabilities: Capabilities) -> bool {
        capabilities.contains(Capabilities::CACHEABLE)
    }

    async fn intercept<R: Request>(
        &self,
        ctx: &RequestContext<R>,
        next: Next<'_, R>,
    ) -> HandlerResult<R::Response> {
        let Some(key) = ctx.request().cache_key() else {
            return next.run().await;
        };
        let key = format!("{}::{}", ctx.request_type(), key);

        if let Some(entry) = self.cache.get(&key).await {
            match entry.downcast_ref::<R::Response>() {
                Some(response) => {
                    debug!(%key, "cache hit");
                    return Ok(Outcome::success(response.clone()));
                }
                None => warn!(%key, "cached entry has an unexpected type; ignoring it"),
            }
        }

        let outcome = next.run().await?;
        if let Outcome::Success(response) = &outcome {
            let expiration = ctx
                .request()
                .cache_expiration()
                .unwrap_or_else(|| self.default_expiration());
            self.cache
                .set(&key, Arc::new(response.clone()), expiration)
                .await;
            debug!(%key, ?expiration, "response cached");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cache::MemoryCache, chain::InterceptChain, intercepts, testing::StubHandler};
    use courier_core::{Message, OperationContext};

    struct GetPrice {
        sku: &'static str,
    }
    impl Message for GetPrice {}
    impl Request for GetPrice {
        type Response = u32;
        const CAPABILITIES: Capabilities = Capabilities::CACHEABLE;

        fn cache_key(&self) -> Option<String> {
            Some(self.sku.to_string())
        }
    }

    struct Uncached;
    impl Message for Uncached {}
    impl Request for Uncached {
        type Response = u32;
        const CAPABILITIES: Capabilities = Capabilities::CACHEABLE;
    }

    fn ctx<R: Request>(request: R) -> RequestContext<R> {
        RequestContext::new(request, OperationContext::default())
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let cache = MemoryCache::new();
        let chain = intercepts![Caching::new(cache.clone())];
        let handler = StubHandler::new(42);

        let first = chain.run(&ctx(GetPrice { sku: "a" }), &handler).await.unwrap();
        let second = chain.run(&ctx(GetPrice { sku: "a" }), &handler).await.unwrap();

        assert_eq!(first, Outcome::success(42));
        assert_eq!(second, Outcome::success(42));
        assert_eq!(handler.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_miss() {
        let chain = intercepts![Caching::new(MemoryCache::new())];
        let handler = StubHandler::new(42);

        chain.run(&ctx(GetPrice { sku: "a" }), &handler).await.unwrap();
        chain.run(&ctx(GetPrice { sku: "b" }), &handler).await.unwrap();

        assert_eq!(handler.calls(), 2);
    }

    #[tokio::test]
    async fn test_request_without_key_bypasses_cache() {
        let cache = MemoryCache::new();
        let chain = intercepts![Caching::new(cache.clone())];
        let handler = StubHandler::new(1);

        chain.run(&ctx(Uncached), &handler).await.unwrap();
        chain.run(&ctx(Uncached), &handler).await.unwrap();

        assert_eq!(handler.calls(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_default_expiration() {
        let caching = Caching::new(MemoryCache::new());
        assert_eq!(caching.default_expiration(), DEFAULT_CACHE_EXPIRATION);
        let caching = caching.with_default_expiration(Duration::from_secs(1));
        assert_eq!(caching.default_expiration(), Duration::from_secs(1));
    }
}

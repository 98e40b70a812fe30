//! Remote definition resolver.
//!
//! Unknown `EPSG:<code>` identifiers are looked up against an epsg.io-style service and
//! the first result's proj4 string is installed in the [`Registry`]. Concurrent lookups
//! of the same code share a single request.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ResolveError;
use crate::registry::Registry;

/// Body returned by the lookup service.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub number_result: u64,
    #[serde(default)]
    pub results: Vec<LookupResult>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LookupResult {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub proj4: Option<String>,
}

/// Transport for lookups. Called on tokio's blocking pool, so implementations may block.
pub trait DefinitionSource: Send + Sync {
    /// Fetch the entries for the numeric part of an EPSG code.
    fn fetch(&self, code: &str) -> Result<LookupResponse, ResolveError>;
}

/// Blocking HTTP client against the configured lookup endpoint.
pub struct HttpDefinitionSource {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpDefinitionSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: ureq::Agent::new(),
        }
    }
}

impl DefinitionSource for HttpDefinitionSource {
    fn fetch(&self, code: &str) -> Result<LookupResponse, ResolveError> {
        let response = self
            .agent
            .get(&self.endpoint)
            .query("q", code)
            .call()
            .map_err(|e| ResolveError::Http(e.to_string()))?;
        response
            .into_json::<LookupResponse>()
            .map_err(|e| ResolveError::Decode(e.to_string()))
    }
}

type PendingLookup = Shared<BoxFuture<'static, Result<String, ResolveError>>>;

pub struct Resolver {
    registry: Arc<Registry>,
    source: Arc<dyn DefinitionSource>,
    in_flight: Mutex<HashMap<String, PendingLookup>>,
}

impl Resolver {
    pub fn new(registry: Arc<Registry>, source: Arc<dyn DefinitionSource>) -> Self {
        Self {
            registry,
            source,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `code` belongs to an authority this resolver can query.
    pub fn supports(code: &str) -> bool {
        parse_code(code).is_some()
    }

    /// Resolve `code` to its definition, registering it on success.
    ///
    /// Registered codes resolve without a request; codes outside the EPSG scheme fail
    /// with [`ResolveError::UnsupportedScheme`] without one.
    ///
    /// The request runs on tokio's blocking pool, so the future must be polled inside a
    /// tokio runtime. Elsewhere it fails with [`ResolveError::Task`].
    pub async fn lookup(&self, code: &str) -> Result<String, ResolveError> {
        if let Some(definition) = self.registry.get(code) {
            return Ok(definition);
        }
        let number = parse_code(code)
            .ok_or_else(|| ResolveError::UnsupportedScheme(code.to_string()))?
            .to_string();

        let pending = {
            let mut in_flight = self.in_flight.lock();
            // Re-check under the lock: a request that just finished has already
            // registered the code and left the table.
            if let Some(definition) = self.registry.get(code) {
                return Ok(definition);
            }
            match in_flight.get(code) {
                Some(pending) => {
                    debug!(code, "joining in-flight lookup");
                    pending.clone()
                }
                None => {
                    let pending = fetch_and_register(
                        Arc::clone(&self.registry),
                        Arc::clone(&self.source),
                        code.to_string(),
                        number,
                    )
                    .boxed()
                    .shared();
                    in_flight.insert(code.to_string(), pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        let mut in_flight = self.in_flight.lock();
        if in_flight
            .get(code)
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            in_flight.remove(code);
        }
        result
    }
}

async fn fetch_and_register(
    registry: Arc<Registry>,
    source: Arc<dyn DefinitionSource>,
    code: String,
    number: String,
) -> Result<String, ResolveError> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
        warn!(code = %code, "projection lookup outside a tokio runtime");
        ResolveError::Task(e.to_string())
    })?;
    debug!(code = %code, "requesting projection definition");
    let response = runtime
        .spawn_blocking(move || source.fetch(&number))
        .await
        .map_err(|e| ResolveError::Task(e.to_string()))?;

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            warn!(code = %code, error = %e, "projection lookup failed");
            return Err(e);
        }
    };

    let definition = if response.number_result == 0 {
        None
    } else {
        response.results.into_iter().next().and_then(|r| r.proj4)
    };
    let Some(definition) = definition else {
        warn!(code = %code, "projection lookup returned no definition");
        return Err(ResolveError::NotFound(code));
    };

    info!(code = %code, "registered projection from lookup");
    registry.define(code, definition.clone());
    Ok(definition)
}

/// `EPSG:<digits>` (authority case-insensitive, whitespace tolerated) → digits.
fn parse_code(code: &str) -> Option<&str> {
    let (authority, number) = code.split_once(':')?;
    let number = number.trim();
    let valid = authority.trim().eq_ignore_ascii_case("EPSG")
        && !number.is_empty()
        && number.bytes().all(|b| b.is_ascii_digit());
    valid.then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";

    /// Answers every request with `response`, counting calls.
    struct FakeSource {
        response: Result<LookupResponse, ResolveError>,
        calls: AtomicUsize,
        queries: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl FakeSource {
        fn new(response: Result<LookupResponse, ResolveError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
                delay: Duration::from_millis(50),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DefinitionSource for FakeSource {
        fn fetch(&self, code: &str) -> Result<LookupResponse, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().push(code.to_string());
            std::thread::sleep(self.delay);
            self.response.clone()
        }
    }

    fn found(proj4: &str) -> LookupResponse {
        LookupResponse {
            status: "ok".into(),
            number_result: 1,
            results: vec![LookupResult {
                code: Some("5000".into()),
                name: Some("WGS 84".into()),
                proj4: Some(proj4.into()),
            }],
        }
    }

    fn empty() -> LookupResponse {
        LookupResponse {
            status: "ok".into(),
            number_result: 0,
            results: Vec::new(),
        }
    }

    fn resolver(source: Arc<FakeSource>) -> (Arc<Registry>, Resolver) {
        let registry = Arc::new(Registry::new());
        let resolver = Resolver::new(Arc::clone(&registry), source);
        (registry, resolver)
    }

    #[tokio::test]
    async fn test_lookup_registers_definition() {
        let source = FakeSource::new(Ok(found(WGS84)));
        let (registry, resolver) = resolver(Arc::clone(&source));

        let def = resolver.lookup("EPSG:5000").await.unwrap();
        assert_eq!(def, WGS84);
        assert!(registry.has("EPSG:5000"));
        assert_eq!(*source.queries.lock(), vec!["5000".to_string()]);

        resolver.lookup("EPSG:5000").await.unwrap();
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_registered_code_needs_no_request() {
        let source = FakeSource::new(Ok(found(WGS84)));
        let (_, resolver) = resolver(Arc::clone(&source));
        let def = resolver.lookup("EPSG:4326").await.unwrap();
        assert!(def.starts_with("+proj=longlat"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_not_found_leaves_registry_unchanged() {
        let source = FakeSource::new(Ok(empty()));
        let (registry, resolver) = resolver(source);
        let before = registry.len();
        assert_eq!(
            resolver.lookup("EPSG:5001").await,
            Err(ResolveError::NotFound("EPSG:5001".into()))
        );
        assert!(!registry.has("EPSG:5001"));
        assert_eq!(registry.len(), before);
    }

    #[tokio::test]
    async fn test_result_without_proj4_is_not_found() {
        let mut response = found(WGS84);
        response.results[0].proj4 = None;
        let (registry, resolver) = resolver(FakeSource::new(Ok(response)));
        assert!(matches!(
            resolver.lookup("EPSG:5002").await,
            Err(ResolveError::NotFound(_))
        ));
        assert!(!registry.has("EPSG:5002"));
    }

    #[tokio::test]
    async fn test_unsupported_scheme_skips_network() {
        let source = FakeSource::new(Ok(found(WGS84)));
        let (registry, resolver) = resolver(Arc::clone(&source));
        assert_eq!(
            resolver.lookup("unknown:5002").await,
            Err(ResolveError::UnsupportedScheme("unknown:5002".into()))
        );
        assert!(matches!(
            resolver.lookup("EPSG:abc").await,
            Err(ResolveError::UnsupportedScheme(_))
        ));
        assert!(!registry.has("unknown:5002"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_request() {
        let source = FakeSource::new(Ok(found(WGS84)));
        let (_, resolver) = resolver(Arc::clone(&source));
        let (a, b, c) = tokio::join!(
            resolver.lookup("EPSG:5000"),
            resolver.lookup("EPSG:5000"),
            resolver.lookup("EPSG:5000"),
        );
        assert_eq!(a.unwrap(), WGS84);
        assert_eq!(b.unwrap(), WGS84);
        assert_eq!(c.unwrap(), WGS84);
        assert_eq!(source.calls(), 1);
        assert!(resolver.in_flight.lock().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_failure_fans_out() {
        let source = FakeSource::new(Err(ResolveError::Http("503".into())));
        let (_, resolver) = resolver(Arc::clone(&source));
        let (a, b) = tokio::join!(resolver.lookup("EPSG:5003"), resolver.lookup("EPSG:5003"));
        assert_eq!(a, Err(ResolveError::Http("503".into())));
        assert_eq!(b, Err(ResolveError::Http("503".into())));
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_lookup_without_runtime_fails() {
        let source = FakeSource::new(Ok(found(WGS84)));
        let (registry, resolver) = resolver(Arc::clone(&source));
        let result = futures::executor::block_on(resolver.lookup("EPSG:5000"));
        assert!(matches!(result, Err(ResolveError::Task(_))));
        assert_eq!(source.calls(), 0);
        assert!(!registry.has("EPSG:5000"));
        assert!(resolver.in_flight.lock().is_empty());

        // Registered codes never need the runtime.
        let def = futures::executor::block_on(resolver.lookup("EPSG:4326")).unwrap();
        assert!(def.starts_with("+proj=longlat"));
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code("EPSG:5000"), Some("5000"));
        assert_eq!(parse_code("epsg: 3857 "), Some("3857"));
        assert_eq!(parse_code("unknown:5002"), None);
        assert_eq!(parse_code("EPSG:"), None);
        assert_eq!(parse_code("EPSG3857"), None);
    }

    #[test]
    fn test_response_decoding() {
        let body = r#"{"status": "ok", "number_result": 1, "results": [{
            "code": "5000", "kind": "CRS-PROJCRS", "bbox": [85.06, 180.0, 85.06, 180.0],
            "unit": "degree", "proj4": "+proj=longlat +datum=WGS84 +no_defs",
            "name": "WGS 84", "area": "World", "default_trans": 0, "trans": [], "accuracy": ""
        }]}"#;
        let response: LookupResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.number_result, 1);
        assert_eq!(response.results[0].proj4.as_deref(), Some(WGS84));
    }
}

//! Service annotation surface
//!
//! All load-balancer tuning is carried as string annotations on the
//! routed service. Keys are shared by every adapter; unrecognized keys
//! are ignored by the engine.

/// Default protocol for load-balancer ports. For ports listed in
/// [`ANN_TLS_PORTS`] this is overridden to https. Options are tcp,
/// http and https. Defaults to tcp.
pub const ANN_PROTOCOL: &str = "service.beta.kubernetes.io/moorage-loadbalancer-protocol";

/// Comma-separated list of ports that should terminate TLS
/// (e.g. `443,6443,7443`).
pub const ANN_TLS_PORTS: &str = "service.beta.kubernetes.io/moorage-loadbalancer-tls-ports";

/// Base64-encoded certificate used for https ports. Required, together
/// with [`ANN_TLS_KEY`], for every port listed in [`ANN_TLS_PORTS`].
pub const ANN_TLS_CERT: &str = "service.beta.kubernetes.io/moorage-loadbalancer-tls-cert";

/// Base64-encoded private key paired with [`ANN_TLS_CERT`].
pub const ANN_TLS_KEY: &str = "service.beta.kubernetes.io/moorage-loadbalancer-tls-key";

/// Balancing algorithm. `least_connections` and `source` are
/// recognized; anything else falls back to round robin.
pub const ANN_ALGORITHM: &str = "service.beta.kubernetes.io/moorage-loadbalancer-algorithm";

/// Health check type: connection, http or http_body.
pub const ANN_CHECK_TYPE: &str = "service.beta.kubernetes.io/moorage-loadbalancer-check-type";

/// Request path for http/http_body checks. Defaults to `/`.
pub const ANN_CHECK_PATH: &str = "service.beta.kubernetes.io/moorage-loadbalancer-check-path";

/// Body regex an http_body check must match. Required for http_body.
pub const ANN_CHECK_BODY: &str = "service.beta.kubernetes.io/moorage-loadbalancer-check-body";

pub const ANN_CHECK_INTERVAL: &str =
    "service.beta.kubernetes.io/moorage-loadbalancer-check-interval";
pub const ANN_CHECK_TIMEOUT: &str =
    "service.beta.kubernetes.io/moorage-loadbalancer-check-timeout";
pub const ANN_CHECK_ATTEMPTS: &str =
    "service.beta.kubernetes.io/moorage-loadbalancer-check-attempts";
pub const ANN_CHECK_PASSIVE: &str =
    "service.beta.kubernetes.io/moorage-loadbalancer-check-passive";

/// Session stickiness mode, passed through to the provider.
/// Defaults to `table`.
pub const ANN_STICKINESS: &str = "service.beta.kubernetes.io/moorage-loadbalancer-stickiness";

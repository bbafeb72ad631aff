//! Builtin attack vectors, one module per category.

mod ai_vector;
mod auth;
mod backup;
mod business_logic;
mod credentials;
mod dos;
mod extensions;
mod functions;
mod graphql;
mod injection;
mod logging;
mod multi_tenant;
mod network;
mod openapi;
mod postgrest;
mod realtime;
mod rls;
mod rls_policy;
mod service_role;
mod storage;
mod vault;

use crate::attack::Attack;
use crate::check::Check;

type Group = (&'static [Check], &'static [&'static dyn Attack]);

/// Every category's declarative checks and custom probes, in category order.
const GROUPS: [Group; 20] = [
    (rls::CHECKS, &[]),
    (auth::CHECKS, auth::PROBES),
    (storage::CHECKS, storage::PROBES),
    (functions::CHECKS, &[]),
    (realtime::CHECKS, &[]),
    (injection::CHECKS, injection::PROBES),
    (business_logic::CHECKS, &[]),
    (dos::CHECKS, dos::PROBES),
    (graphql::CHECKS, &[]),
    (vault::CHECKS, &[]),
    (multi_tenant::CHECKS, &[]),
    (postgrest::CHECKS, &[]),
    (extensions::CHECKS, &[]),
    (network::CHECKS, network::PROBES),
    (logging::CHECKS, &[]),
    (ai_vector::CHECKS, &[]),
    (backup::CHECKS, &[]),
    (service_role::CHECKS, service_role::PROBES),
    (credentials::CHECKS, credentials::PROBES),
    (rls_policy::CHECKS, rls_policy::PROBES),
];

/// Returns all builtin attacks, grouped by category in registry order.
#[must_use]
pub fn builtin_attacks() -> Vec<&'static dyn Attack> {
    GROUPS
        .into_iter()
        .flat_map(|(checks, probes)| {
            checks
                .iter()
                .map(|check| -> &'static dyn Attack { check })
                .chain(probes.iter().copied())
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn all_checks() -> impl Iterator<Item = &'static Check> {
    GROUPS.into_iter().flat_map(|(checks, _)| checks.iter())
}

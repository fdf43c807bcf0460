//! Router scenarios for hub-and-spoke conversion.
//!
//! Covers direct and routed paths, hub misconfiguration, and the laws every
//! conversion must obey (identity guard, lossless round trip).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crd_conversion::apis::jobs::{self, v1, v2};
use crd_conversion::{
    convert, hub_mut, hub_ref, ConversionError, ConversionRouter, Convertible, Hub, MappingError,
    MissingEndpoint, ObjectMeta, Resource, Scheme, VersionedObject,
};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// `jobs.example.org/v3`: registered in the family but neither hub nor convertible.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ExternalJobV3 {
    #[serde(default)]
    metadata: ObjectMeta,
}

impl Resource for ExternalJobV3 {
    const GROUP: &'static str = jobs::GROUP;
    const VERSION: &'static str = "v3";
    const KIND: &'static str = jobs::EXTERNAL_JOB;
}

/// `jobs.example.org/v1beta1`: a second spoke with its own field name.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct ExternalJobBeta {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    when: String,
}

impl Convertible for ExternalJobBeta {
    fn convert_to(&self, hub: &mut dyn VersionedObject) -> Result<(), MappingError> {
        let job = hub_mut::<v2::ExternalJob>(hub)?;
        job.metadata = self.metadata.clone();
        job.spec.schedule_at = self.when.clone();
        Ok(())
    }

    fn convert_from(&mut self, hub: &dyn VersionedObject) -> Result<(), MappingError> {
        let job = hub_ref::<v2::ExternalJob>(hub)?;
        self.metadata = job.metadata.clone();
        self.when = job.spec.schedule_at.clone();
        Ok(())
    }
}

impl Resource for ExternalJobBeta {
    const GROUP: &'static str = jobs::GROUP;
    const VERSION: &'static str = "v1beta1";
    const KIND: &'static str = jobs::EXTERNAL_JOB;

    fn as_convertible(&self) -> Option<&dyn Convertible> {
        Some(self)
    }

    fn as_convertible_mut(&mut self) -> Option<&mut dyn Convertible> {
        Some(self)
    }
}

fn jobs_scheme() -> Arc<Scheme> {
    let scheme = jobs::add_to_scheme(Scheme::builder())
        .register::<ExternalJobV3>()
        .register::<ExternalJobBeta>()
        .build()
        .unwrap();
    Arc::new(scheme)
}

fn make_v1(name: &str, run_at: &str) -> v1::ExternalJob {
    v1::ExternalJob {
        metadata: ObjectMeta::named("default", name),
        spec: v1::ExternalJobSpec {
            run_at: run_at.to_string(),
        },
        ..Default::default()
    }
}

/// Declares a test kind in `probe.example.org/Probe` with the given version and role.
macro_rules! probe_kind {
    ($name:ident, $version:literal, hub) => {
        #[derive(Debug, Default, Serialize, Deserialize)]
        struct $name {
            #[serde(default)]
            value: String,
            #[serde(default)]
            visited_hub: bool,
        }

        impl Hub for $name {}

        impl Resource for $name {
            const GROUP: &'static str = "probe.example.org";
            const VERSION: &'static str = $version;
            const KIND: &'static str = "Probe";

            fn as_hub(&self) -> Option<&dyn Hub> {
                Some(self)
            }
        }
    };
    ($name:ident, $version:literal, inert) => {
        #[derive(Debug, Default, Serialize, Deserialize)]
        struct $name {
            #[serde(default)]
            value: String,
        }

        impl Resource for $name {
            const GROUP: &'static str = "probe.example.org";
            const VERSION: &'static str = $version;
            const KIND: &'static str = "Probe";
        }
    };
}

probe_kind!(ProbeHub, "v2", hub);
probe_kind!(ProbeOtherHub, "v3", hub);
probe_kind!(ProbeInert, "v1alpha1", inert);

/// Spoke that records whether it saw the hub.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProbeSpoke {
    #[serde(default)]
    value: String,
    #[serde(default)]
    came_through_hub: bool,
}

impl Convertible for ProbeSpoke {
    fn convert_to(&self, hub: &mut dyn VersionedObject) -> Result<(), MappingError> {
        let hub = hub_mut::<ProbeHub>(hub)?;
        hub.value = self.value.clone();
        hub.visited_hub = true;
        Ok(())
    }

    fn convert_from(&mut self, hub: &dyn VersionedObject) -> Result<(), MappingError> {
        let hub = hub_ref::<ProbeHub>(hub)?;
        self.value = hub.value.clone();
        self.came_through_hub = hub.visited_hub;
        Ok(())
    }
}

impl Resource for ProbeSpoke {
    const GROUP: &'static str = "probe.example.org";
    const VERSION: &'static str = "v1";
    const KIND: &'static str = "Probe";

    fn as_convertible(&self) -> Option<&dyn Convertible> {
        Some(self)
    }

    fn as_convertible_mut(&mut self) -> Option<&mut dyn Convertible> {
        Some(self)
    }
}

/// Second spoke with the same mapping, used for spoke-to-spoke paths.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProbeSpokeBeta {
    #[serde(default)]
    value: String,
    #[serde(default)]
    came_through_hub: bool,
}

impl Convertible for ProbeSpokeBeta {
    fn convert_to(&self, hub: &mut dyn VersionedObject) -> Result<(), MappingError> {
        let hub = hub_mut::<ProbeHub>(hub)?;
        hub.value = self.value.clone();
        hub.visited_hub = true;
        Ok(())
    }

    fn convert_from(&mut self, hub: &dyn VersionedObject) -> Result<(), MappingError> {
        let hub = hub_ref::<ProbeHub>(hub)?;
        self.value = hub.value.clone();
        self.came_through_hub = hub.visited_hub;
        Ok(())
    }
}

impl Resource for ProbeSpokeBeta {
    const GROUP: &'static str = "probe.example.org";
    const VERSION: &'static str = "v1beta1";
    const KIND: &'static str = "Probe";

    fn as_convertible(&self) -> Option<&dyn Convertible> {
        Some(self)
    }

    fn as_convertible_mut(&mut self) -> Option<&mut dyn Convertible> {
        Some(self)
    }
}

static COUNTED_CALLS: AtomicUsize = AtomicUsize::new(0);

/// Spoke that counts every conversion call made on it.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CountedSpoke {
    #[serde(default)]
    value: String,
}

impl Convertible for CountedSpoke {
    fn convert_to(&self, hub: &mut dyn VersionedObject) -> Result<(), MappingError> {
        COUNTED_CALLS.fetch_add(1, Ordering::SeqCst);
        hub_mut::<ProbeHub>(hub)?.value = self.value.clone();
        Ok(())
    }

    fn convert_from(&mut self, hub: &dyn VersionedObject) -> Result<(), MappingError> {
        COUNTED_CALLS.fetch_add(1, Ordering::SeqCst);
        self.value = hub_ref::<ProbeHub>(hub)?.value.clone();
        Ok(())
    }
}

impl Resource for CountedSpoke {
    const GROUP: &'static str = "probe.example.org";
    const VERSION: &'static str = "v1beta2";
    const KIND: &'static str = "Probe";

    fn as_convertible(&self) -> Option<&dyn Convertible> {
        Some(self)
    }

    fn as_convertible_mut(&mut self) -> Option<&mut dyn Convertible> {
        Some(self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExternalJob Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_v1_to_hub_carries_fields_and_metadata() {
    let scheme = jobs_scheme();
    let source = make_v1("obj-1", "2024-01-01T00:00:00Z");
    let mut hub = v2::ExternalJob::default();

    convert(&scheme, &source, &mut hub).unwrap();

    assert_eq!(hub.spec.schedule_at, "2024-01-01T00:00:00Z");
    assert_eq!(hub.metadata.name.as_deref(), Some("obj-1"));
}

#[test]
fn test_hub_back_to_v1_restores_original() {
    let scheme = jobs_scheme();
    let source = make_v1("obj-1", "2024-01-01T00:00:00Z");
    let mut hub = v2::ExternalJob::default();
    convert(&scheme, &source, &mut hub).unwrap();

    let mut back = v1::ExternalJob::default();
    convert(&scheme, &hub, &mut back).unwrap();

    assert_eq!(back, source);
}

#[test]
fn test_spoke_to_spoke_goes_through_hub() {
    let router = ConversionRouter::new(jobs_scheme());
    let source = make_v1("obj-2", "2025-06-30T12:00:00Z");
    let mut beta = ExternalJobBeta::default();

    router.convert(&source, &mut beta).unwrap();

    assert_eq!(beta.when, "2025-06-30T12:00:00Z");
    assert_eq!(beta.metadata.name.as_deref(), Some("obj-2"));
    assert_eq!(router.cache_stats().misses, 1);
}

#[test]
fn test_v1_to_v3_requires_both_endpoints_convertible() {
    let scheme = jobs_scheme();
    let err = convert(&scheme, &make_v1("obj-1", "now"), &mut ExternalJobV3::default()).unwrap_err();

    match err {
        ConversionError::BothEndpointsMustBeConvertible { from, to, missing } => {
            assert_eq!(from, v1::ExternalJob::gvk());
            assert_eq!(to, ExternalJobV3::gvk());
            assert_eq!(missing, MissingEndpoint::Destination);
        }
        other => panic!("expected BothEndpointsMustBeConvertible, got {other:?}"),
    }
}

#[test]
fn test_hub_to_v3_is_destination_not_convertible() {
    let scheme = jobs_scheme();
    let err = convert(&scheme, &v2::ExternalJob::default(), &mut ExternalJobV3::default()).unwrap_err();
    assert!(matches!(err, ConversionError::DestinationNotConvertible { gvk, .. } if gvk == ExternalJobV3::gvk()));
}

#[test]
fn test_v3_to_hub_is_source_not_convertible() {
    let scheme = jobs_scheme();
    let err = convert(&scheme, &ExternalJobV3::default(), &mut v2::ExternalJob::default()).unwrap_err();
    assert!(matches!(err, ConversionError::SourceNotConvertible { gvk, .. } if gvk == ExternalJobV3::gvk()));
}

#[test]
fn test_unregistered_source_fails_on_routed_path() {
    let scheme = Arc::new(jobs::add_to_scheme(Scheme::builder()).build().unwrap());
    let err = convert(&scheme, &ExternalJobBeta::default(), &mut make_v1("x", "y")).unwrap_err();
    assert!(matches!(err, ConversionError::Scheme(_)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Hub Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_routed_conversion_exposes_intermediate_hub() {
    let scheme = Scheme::builder()
        .register::<ProbeHub>()
        .register::<ProbeSpoke>()
        .register::<ProbeSpokeBeta>()
        .build()
        .unwrap();

    let source = ProbeSpokeBeta {
        value: "payload".to_string(),
        came_through_hub: false,
    };
    let mut destination = ProbeSpoke::default();
    convert(&scheme, &source, &mut destination).unwrap();

    assert_eq!(destination.value, "payload");
    assert!(destination.came_through_hub);
}

#[test]
fn test_no_hub_defined() {
    let scheme = Scheme::builder()
        .register::<ProbeSpoke>()
        .register::<ProbeSpokeBeta>()
        .build_unvalidated()
        .unwrap();

    let err = convert(&scheme, &ProbeSpoke::default(), &mut ProbeSpokeBeta::default()).unwrap_err();
    match err {
        ConversionError::NoHubDefined { family } => assert_eq!(family.to_string(), "probe.example.org/Probe"),
        other => panic!("expected NoHubDefined, got {other:?}"),
    }
}

#[test]
fn test_multiple_hubs_defined() {
    let scheme = Scheme::builder()
        .register::<ProbeHub>()
        .register::<ProbeOtherHub>()
        .register::<ProbeSpoke>()
        .register::<ProbeSpokeBeta>()
        .build_unvalidated()
        .unwrap();

    let err = convert(&scheme, &ProbeSpoke::default(), &mut ProbeSpokeBeta::default()).unwrap_err();
    match err {
        ConversionError::MultipleHubsDefined { hubs, .. } => {
            assert_eq!(hubs, vec![ProbeOtherHub::gvk(), ProbeHub::gvk()]);
        }
        other => panic!("expected MultipleHubsDefined, got {other:?}"),
    }
}

#[test]
fn test_validated_scheme_rejects_two_hubs() {
    let result = Scheme::builder()
        .register::<ProbeHub>()
        .register::<ProbeOtherHub>()
        .build();
    assert!(result.is_err());
}

#[test]
fn test_non_convertible_spoke_invokes_no_conversion() {
    let scheme = Scheme::builder()
        .register::<ProbeHub>()
        .register::<CountedSpoke>()
        .register::<ProbeInert>()
        .build()
        .unwrap();

    let err = convert(&scheme, &CountedSpoke::default(), &mut ProbeInert::default()).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::BothEndpointsMustBeConvertible { missing: MissingEndpoint::Destination, .. }
    ));

    let err = convert(&scheme, &ProbeInert::default(), &mut CountedSpoke::default()).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::BothEndpointsMustBeConvertible { missing: MissingEndpoint::Source, .. }
    ));

    assert_eq!(COUNTED_CALLS.load(Ordering::SeqCst), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Concurrency
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_concurrent_conversions_share_one_hub_cache() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;

    let router = Arc::new(ConversionRouter::new(jobs_scheme()));

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let name = format!("job-{t}-{i}");
                    let run_at = format!("2024-01-01T00:{t:02}:{i:02}Z");
                    let source = make_v1(&name, &run_at);

                    let mut beta = ExternalJobBeta::default();
                    router.convert(&source, &mut beta).unwrap();
                    assert_eq!(beta.when, run_at);
                    assert_eq!(beta.metadata.name.as_deref(), Some(name.as_str()));

                    let mut back = v1::ExternalJob::default();
                    router.convert(&beta, &mut back).unwrap();
                    assert_eq!(back, source);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let stats = router.cache_stats();
    assert_eq!(stats.hits + stats.misses, (THREADS * PER_THREAD * 2) as u64);
    assert!(stats.misses >= 1);
    assert_eq!(stats.entries, 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

fn arb_meta() -> impl Strategy<Value = ObjectMeta> {
    (
        "[a-z][a-z0-9-]{0,20}",
        "[a-z]{1,10}",
        prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 0..4),
    )
        .prop_map(|(name, namespace, labels)| ObjectMeta {
            labels,
            ..ObjectMeta::named(namespace, name)
        })
}

fn arb_v1() -> impl Strategy<Value = v1::ExternalJob> {
    (arb_meta(), ".{0,32}").prop_map(|(metadata, run_at)| v1::ExternalJob {
        metadata,
        spec: v1::ExternalJobSpec { run_at },
        ..Default::default()
    })
}

proptest! {
    #[test]
    fn same_version_is_always_rejected(job in arb_v1()) {
        let scheme = jobs_scheme();
        let mut destination = v1::ExternalJob::default();
        let result = convert(&scheme, &job, &mut destination);
        let is_same_version = matches!(result, Err(ConversionError::SameVersionConversion { .. }));
        prop_assert!(is_same_version);
        prop_assert_eq!(destination, v1::ExternalJob::default());
    }

    #[test]
    fn spoke_hub_spoke_round_trip_is_lossless(job in arb_v1()) {
        let router = ConversionRouter::new(jobs_scheme());

        let mut hub = v2::ExternalJob::default();
        router.convert(&job, &mut hub).unwrap();
        let mut back = v1::ExternalJob::default();
        router.convert(&hub, &mut back).unwrap();

        prop_assert_eq!(back, job);
    }

    #[test]
    fn routed_round_trip_is_lossless(job in arb_v1()) {
        let router = ConversionRouter::new(jobs_scheme());

        let mut beta = ExternalJobBeta::default();
        router.convert(&job, &mut beta).unwrap();
        let mut back = v1::ExternalJob::default();
        router.convert(&beta, &mut back).unwrap();

        prop_assert_eq!(back, job);
    }
}

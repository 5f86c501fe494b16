// tests/candidate.rs

//! Candidate build tests: success, failed planning, degraded builds.

mod common;

use cairn::cache::ArtifactCache;
use cairn::candidate::EXPORT_SYSTEM_PATHS;
use cairn::installation::paths;
use cairn::{
    inspect_candidate, ArtifactCoordinate, BuildWarning, CandidateBuilder, CandidateState,
    CandidateStatus, ChannelArtifactResolver, Error, FilesystemSource, InstallationMetadata,
    OperationKind, StagingDir,
};
use common::{feature_pack_key, jar, setup_installation, StubPlanner};
use std::fs;
use std::io;

fn resolver_for(builder: &CandidateBuilder) -> ChannelArtifactResolver {
    builder.new_resolver(Box::new(FilesystemSource::new())).unwrap()
}

#[test]
fn test_successful_build_writes_complete_candidate() {
    let fixture = setup_installation();
    let live_manifest = fs::read(paths::manifest_file(&fixture.base)).unwrap();

    let mut builder = CandidateBuilder::new(&fixture.base).unwrap();
    let base_revision = builder.base_revision().id.clone();
    let mut resolver = resolver_for(&builder);
    let mut planner = StubPlanner::new(vec![ArtifactCoordinate::new("org.foo", "bar").with_version("1.0")]);
    let staging = StagingDir::create(fixture.staging_path()).unwrap();

    let report = builder
        .build_candidate(&staging, &mut resolver, &mut planner, OperationKind::Update)
        .unwrap();

    assert_eq!(report.state, CandidateState::Marked);
    assert_eq!(builder.state(), CandidateState::Marked);
    assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);
    assert_eq!(report.marker.revision, base_revision);
    assert_eq!(report.marker.operation, OperationKind::Update);
    assert_eq!(report.resolved.len(), 1);
    assert_eq!(report.resolved[0].version, "1.5");
    assert_eq!(report.cached_artifacts, 1);
    assert!(report.manifest_versions.is_some());

    // Planner saw the candidate options
    assert!(planner.options.as_ref().unwrap().get(EXPORT_SYSTEM_PATHS) == Some("true"));

    // Persisted layout
    let target = staging.path();
    for path in [
        paths::manifest_file(target),
        paths::channels_file(target),
        paths::manifest_versions_file(target),
        paths::history_file(target),
        paths::marker_file(target),
        paths::provisioning_file(target),
        paths::cache_dir(target).join(cairn::cache::INDEX_FILE),
    ] {
        assert!(path.exists(), "missing {}", path.display());
    }

    // Candidate metadata pins what was resolved
    let candidate = InstallationMetadata::load(target).unwrap();
    let stream = candidate.manifest().find_stream("org.foo", "bar").unwrap();
    assert_eq!(stream.version.as_deref(), Some("1.5"));
    assert_eq!(candidate.channels().len(), 1);

    // Resolved jars and feature packs are cached
    let cache = ArtifactCache::open(target).unwrap();
    assert!(cache.lookup(&jar("org.foo", "bar"), "1.5").is_some());
    assert!(cache.lookup(&feature_pack_key(), "27.0.0").is_some());

    // Marker names a revision of the live installation
    let live = InstallationMetadata::load(&fixture.base).unwrap();
    report.marker.validate(&live).unwrap();
    assert_eq!(
        inspect_candidate(target).unwrap(),
        CandidateStatus::Complete(report.marker.clone())
    );

    // Live installation untouched
    assert_eq!(fs::read(paths::manifest_file(&fixture.base)).unwrap(), live_manifest);
    assert!(!paths::marker_file(&fixture.base).exists());
}

#[test]
fn test_failed_planning_leaves_no_marker() {
    let fixture = setup_installation();
    let mut builder = CandidateBuilder::new(&fixture.base).unwrap();
    let mut resolver = resolver_for(&builder);
    let mut planner = StubPlanner::new(vec![
        ArtifactCoordinate::new("org.foo", "bar").with_version("1.0"),
        ArtifactCoordinate::new("org.foo", "missing").with_version("1.0"),
    ]);
    let staging = StagingDir::create(fixture.staging_path()).unwrap();

    let err = builder
        .build_candidate(&staging, &mut resolver, &mut planner, OperationKind::Update)
        .unwrap_err();

    match err {
        Error::ArtifactResolution {
            artifacts,
            repositories,
            offline,
            ..
        } => {
            assert_eq!(artifacts, vec!["org.foo:missing:jar:1.0".to_string()]);
            assert_eq!(repositories.len(), 1);
            assert!(repositories[0].starts_with("base"));
            assert!(!offline);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(builder.state(), CandidateState::Failed);
    assert!(!paths::marker_file(staging.path()).exists());
    assert_eq!(staging.status().unwrap(), CandidateStatus::Incomplete);

    // Caller decides what happens to the leftovers
    let path = staging.path().to_path_buf();
    staging.discard().unwrap();
    assert!(!path.exists());
}

#[test]
fn test_failing_manifest_version_lookup_is_not_fatal() {
    let fixture = setup_installation();
    let mut builder = CandidateBuilder::new(&fixture.base)
        .unwrap()
        .with_manifest_version_resolver(Box::new(|_| {
            Err(Error::Io(io::Error::new(io::ErrorKind::TimedOut, "network hiccup")))
        }));
    let mut resolver = resolver_for(&builder);
    let mut planner = StubPlanner::new(vec![ArtifactCoordinate::new("org.foo", "bar").with_version("1.0")]);
    let staging = StagingDir::create(fixture.staging_path()).unwrap();

    let report = builder
        .build_candidate(&staging, &mut resolver, &mut planner, OperationKind::Revert)
        .unwrap();

    assert_eq!(report.state, CandidateState::Marked);
    assert!(report.manifest_versions.is_none());
    assert_eq!(report.cached_artifacts, 0);
    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(report.warnings[0], BuildWarning::ManifestVersionLookup(_)));
    assert!(report.is_degraded());

    assert!(paths::marker_file(staging.path()).exists());
    assert!(!paths::manifest_versions_file(staging.path()).exists());
    assert_eq!(report.marker.operation, OperationKind::Revert);
}

#[test]
fn test_missing_feature_pack_is_a_warning() {
    let fixture = setup_installation();
    fs::remove_dir_all(fixture.repo.join("org/wildfly")).unwrap();

    let mut builder = CandidateBuilder::new(&fixture.base).unwrap();
    let mut resolver = resolver_for(&builder);
    let mut planner = StubPlanner::new(Vec::new());
    let staging = StagingDir::create(fixture.staging_path()).unwrap();

    let report = builder
        .build_candidate(&staging, &mut resolver, &mut planner, OperationKind::Update)
        .unwrap();

    assert_eq!(report.state, CandidateState::Marked);
    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(report.warnings[0], BuildWarning::FeaturePackCache(_)));
    assert!(staging.status().unwrap().is_complete());
}

#[test]
fn test_cache_write_failure_is_a_warning() {
    let fixture = setup_installation();
    let mut builder = CandidateBuilder::new(&fixture.base).unwrap();
    let mut resolver = resolver_for(&builder);
    let mut planner = StubPlanner::new(vec![ArtifactCoordinate::new("org.foo", "bar").with_version("1.0")])
        .leaving_file(paths::cache_dir);
    let staging = StagingDir::create(fixture.staging_path()).unwrap();

    let report = builder
        .build_candidate(&staging, &mut resolver, &mut planner, OperationKind::Update)
        .unwrap();

    assert_eq!(report.state, CandidateState::Marked);
    assert_eq!(report.cached_artifacts, 0);
    assert!(report.manifest_versions.is_some());
    assert!(matches!(report.warnings[0], BuildWarning::CacheWrite(_)));
    // Feature packs share the unusable cache directory
    assert!(report
        .warnings
        .iter()
        .skip(1)
        .all(|w| matches!(w, BuildWarning::FeaturePackCache(_))));

    assert!(paths::manifest_file(staging.path()).exists());
    assert!(staging.status().unwrap().is_complete());
}

#[test]
fn test_metadata_write_failure_is_fatal() {
    let fixture = setup_installation();
    let mut builder = CandidateBuilder::new(&fixture.base).unwrap();
    let mut resolver = resolver_for(&builder);
    let mut planner = StubPlanner::new(vec![ArtifactCoordinate::new("org.foo", "bar").with_version("1.0")])
        .leaving_dir(paths::channels_file);
    let staging = StagingDir::create(fixture.staging_path()).unwrap();

    let err = builder
        .build_candidate(&staging, &mut resolver, &mut planner, OperationKind::Update)
        .unwrap_err();

    match err {
        Error::MetadataWrite { path, .. } => assert_eq!(path, paths::channels_file(staging.path())),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(builder.state(), CandidateState::Failed);
    assert!(!paths::marker_file(staging.path()).exists());
    assert_eq!(staging.status().unwrap(), CandidateStatus::Incomplete);
}

#[test]
fn test_installation_without_revision_is_rejected() {
    let fixture = setup_installation();
    fs::remove_file(paths::history_file(&fixture.base)).unwrap();

    let err = CandidateBuilder::new(&fixture.base).err().unwrap();
    assert!(matches!(err, Error::NoRevision(_)));
}

#[test]
fn test_staging_must_start_empty() {
    let fixture = setup_installation();
    let path = fixture.staging_path();
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("stale"), b"x").unwrap();

    assert!(matches!(StagingDir::create(&path), Err(Error::StagingNotEmpty(_))));
}

//! Tests for listing, inspecting, removing and decrypting deployments.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use chrono::Utc;
use swarm_cli::application::services::deploy::{DeployOutcome, DeployRequest, deploy_at};
use swarm_cli::application::services::deployments::{
    BundleState, bundle_state, decrypt_with_key, decrypt_with_record, find, key_file_for, remove,
};
use swarm_cli::application::services::package::PackageOptions;
use swarm_cli::application::services::vault_commit::Vault;
use swarm_cli::domain::DeployError;
use swarm_cli::domain::bundle::sha256_hex;

use crate::mocks::{MemFs, MemVault, RecordingReporter, fast_crypto, sample_registry, sample_tree};

fn deployed(label: &str, vault: &mut Vault<MemVault>, fs: &MemFs) -> DeployOutcome {
    let (registry, crypto) = (sample_registry(), fast_crypto());
    deploy_at(
        DeployRequest {
            label,
            tree: sample_tree(),
            registry: &registry,
            crypto: &crypto,
            out_dir: Path::new("/out"),
            package: PackageOptions {
                embed_sources: false,
                stamp_hash: false,
                source_root: None,
                source_template: "{name}.py",
            },
            key_in_memory: false,
            overwrite: false,
        },
        vault,
        fs,
        fs,
        &RecordingReporter::default(),
        Utc::now(),
    )
    .expect("deploy")
}

#[test]
fn test_find_unknown_label_is_not_found() {
    let vault = Vault::open(MemVault::default(), 64).expect("open");
    let err = find(&vault, "ghost").unwrap_err();
    assert!(matches!(err.downcast_ref::<DeployError>(), Some(DeployError::NotFound(_))));
}

#[test]
fn test_remove_drops_record_and_artifacts() {
    let mut vault = Vault::open(MemVault::default(), 64).expect("open");
    let fs = MemFs::default();
    deployed("alpha", &mut vault, &fs);
    let beta = deployed("beta", &mut vault, &fs);
    assert_eq!(fs.file_count(), 4);

    let removed = remove(&mut vault, "beta", &fs).expect("remove");
    assert_eq!(removed.label, "beta");
    assert_eq!(fs.file_count(), 2);
    assert!(fs.file(&beta.bundle_path).is_none());
    assert!(vault.deployment("beta").expect("parse").is_none());
    assert!(vault.deployment("alpha").expect("parse").is_some());
}

#[test]
fn test_key_file_sits_next_to_bundle() {
    let mut vault = Vault::open(MemVault::default(), 64).expect("open");
    let fs = MemFs::default();
    let outcome = deployed("prod", &mut vault, &fs);
    assert_eq!(key_file_for(&outcome.record), outcome.key_path);
}

#[test]
fn test_bundle_state_tracks_disk() {
    let mut vault = Vault::open(MemVault::default(), 64).expect("open");
    let fs = MemFs::default();
    let outcome = deployed("prod", &mut vault, &fs);
    assert_eq!(bundle_state(&outcome.record, &fs), BundleState::Intact);

    fs.files
        .borrow_mut()
        .insert(outcome.bundle_path.clone(), b"{}".to_vec());
    assert_eq!(bundle_state(&outcome.record, &fs), BundleState::Modified);

    fs.files.borrow_mut().remove(&outcome.bundle_path);
    assert_eq!(bundle_state(&outcome.record, &fs), BundleState::Unreadable);
}

#[test]
fn test_decrypt_with_record_verifies_hashes() {
    let mut vault = Vault::open(MemVault::default(), 64).expect("open");
    let fs = MemFs::default();
    let outcome = deployed("prod", &mut vault, &fs);
    let bytes = fs.file(&outcome.bundle_path).expect("bundle");

    let plaintext = decrypt_with_record(&bytes, &outcome.record).expect("opens");
    assert_eq!(sha256_hex(&plaintext), outcome.record.directive_hash);

    let mut tampered = bytes.clone();
    tampered.push(b'\n');
    let err = decrypt_with_record(&tampered, &outcome.record).unwrap_err();
    assert!(err.to_string().contains("hash mismatch"), "got: {err}");
}

#[test]
fn test_decrypt_with_key_accepts_key_file_contents() {
    let mut vault = Vault::open(MemVault::default(), 64).expect("open");
    let fs = MemFs::default();
    let outcome = deployed("prod", &mut vault, &fs);
    let bytes = fs.file(&outcome.bundle_path).expect("bundle");
    let key = String::from_utf8(fs.file(outcome.key_path.as_deref().unwrap()).unwrap()).unwrap();

    assert!(decrypt_with_key(&bytes, &key).is_ok());

    let other = deployed("other", &mut vault, &fs);
    assert!(decrypt_with_key(&bytes, &other.record.swarm_key).is_err());
}

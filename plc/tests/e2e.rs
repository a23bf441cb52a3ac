//! End-to-end tests for the publisher identity engine.
//!
//! These exercise the full identity lifecycle against a mocked PLC
//! directory: genesis creation, key rotation within the verification
//! list, update diffing, persistence, and artifact signing. They prove
//! the components compose: key generation, canonical encoding, CID
//! chaining, the directory client, and the store all meet in `Did`.
//!
//! Each test stands alone with its own mock server and store. No shared
//! state, no ordering dependencies.

use mockito::Matcher;
use serde_json::json;

use fair_plc::artifact;
use fair_plc::encoding::{base64url_decode, multibase_encode};
use fair_plc::keys::PREFIX_ED25519_PRIVATE;
use fair_plc::operation::WireOperation;
use fair_plc::store::DidStore;
use fair_plc::{Curve, Did, Key, MemoryStore, PlcConfig, SledStore, UpdateOutcome};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config_for(server: &mockito::Server) -> PlcConfig {
    PlcConfig::new("https://repo.example.com/wp-json/minifair/v1/packages")
        .with_directory(&server.url())
}

/// A deterministic Ed25519 key for tests that need a fixed signer.
fn fixed_ed25519_key() -> Key {
    let encoded = multibase_encode(PREFIX_ED25519_PRIVATE, &[42u8; 32]);
    Key::from_private(&encoded).expect("fixed key decodes")
}

// ---------------------------------------------------------------------------
// Identity creation
// ---------------------------------------------------------------------------

#[test]
fn create_produces_a_well_formed_genesis_identity() {
    let mut server = mockito::Server::new();
    // The genesis operation must go out with prev: null and both key
    // lists populated; the POST path carries the derived identifier.
    let submit = server
        .mock("POST", Matcher::Regex(r"^/did:plc:[a-z2-7]{24}$".to_string()))
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "type": "plc_operation", "prev": null })),
            Matcher::Regex(r#""rotationKeys":\["did:key:z"#.to_string()),
            Matcher::Regex(r#""verificationMethods":\{"fair_"#.to_string()),
        ]))
        .with_status(200)
        .create();

    let store = MemoryStore::new();
    let did = Did::create(&store, &config_for(&server)).unwrap();
    submit.assert();

    // Exactly one key of each family, id in the did:plc shape.
    let rotation = did.rotation_keys().unwrap();
    let verification = did.verification_keys().unwrap();
    assert_eq!(rotation.len(), 1);
    assert_eq!(verification.len(), 1);
    assert_eq!(rotation[0].curve(), Curve::K256);
    assert_eq!(verification[0].curve(), Curve::Ed25519);

    let suffix = did.id().strip_prefix("did:plc:").expect("did:plc prefix");
    assert_eq!(suffix.len(), 24);
    assert!(suffix
        .chars()
        .all(|c| c.is_ascii_lowercase() || ('2'..='7').contains(&c)));

    // And the record is on disk, ready to be loaded back.
    let record = store.get(did.id()).unwrap().expect("persisted record");
    assert_eq!(record.rotation_keys.len(), 1);
    assert_eq!(record.verification_keys.len(), 1);
}

#[test]
fn identity_survives_a_sled_store_roundtrip() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", Matcher::Regex(r"^/did:plc:".to_string()))
        .with_status(200)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server);
    let id = {
        let store = SledStore::open(dir.path()).unwrap();
        Did::create(&store, &config).unwrap().id().to_string()
    };

    let store = SledStore::open(dir.path()).unwrap();
    let loaded = Did::load(&store, &id, &config).unwrap();
    assert_eq!(loaded.id(), id);
    assert_eq!(loaded.verification_keys().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Key lifecycle + update diffing
// ---------------------------------------------------------------------------

/// Serve `did`'s current draft as the directory tail, so that the next
/// `prepare_update_op` sees no changes unless the draft mutates.
fn mock_tail_matching(server: &mut mockito::Server, did: &Did, config: &PlcConfig) -> mockito::Mock {
    let methods: serde_json::Map<String, serde_json::Value> = did
        .verification_keys()
        .unwrap()
        .iter()
        .map(|key| {
            let digest = <sha2::Sha256 as sha2::Digest>::digest(key.encode_public().as_bytes());
            let id = format!("fair_{}", &hex::encode(digest)[..6]);
            (id, json!(key.encode_did_key()))
        })
        .collect();

    let tail = json!({
        "type": "plc_operation",
        "rotationKeys": did
            .rotation_keys()
            .unwrap()
            .iter()
            .map(Key::encode_did_key)
            .collect::<Vec<_>>(),
        "verificationMethods": methods,
        "alsoKnownAs": [],
        "services": {
            "fairpm_repo": {
                "type": "FairPackageManagementRepo",
                "endpoint": config.repo_endpoint(did.id()),
            }
        },
        "prev": "bafyreicnotarealcidbutvalidbase32",
        "sig": "c2lnbmF0dXJl"
    });

    server
        .mock("GET", format!("/{}/log/last", did.id()).as_str())
        .with_status(200)
        .with_body(tail.to_string())
        .expect_at_least(1)
        .create()
}

#[test]
fn add_then_revoke_leaves_only_the_new_key_and_forces_an_update() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", Matcher::Regex(r"^/did:plc:".to_string()))
        .with_status(200)
        .expect_at_least(1)
        .create();

    let store = MemoryStore::new();
    let config = config_for(&server);
    let mut did = Did::create(&store, &config).unwrap();
    let original = did.verification_keys().unwrap()[0].clone();

    // With the tail matching the as-created state, nothing to do.
    mock_tail_matching(&mut server, &did, &config);
    assert_eq!(did.update().unwrap(), UpdateOutcome::NoChanges);

    // Rotate the verification key: add a new one, revoke the original.
    let added = did.generate_verification_key().unwrap();
    assert!(did.invalidate_verification_key(&original).unwrap());

    let remaining = did.verification_keys().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0], added);

    // Now the diff is real: update emits a signed operation chaining
    // onto the served tail.
    match did.update().unwrap() {
        UpdateOutcome::Updated(op) => {
            op.validate().unwrap();
            assert!(op.operation.prev.is_some());
            assert_eq!(op.operation.verification_methods.len(), 1);
        }
        UpdateOutcome::NoChanges => panic!("expected a state change"),
    }
    did.save(&store).unwrap();

    let record = store.get(did.id()).unwrap().unwrap();
    assert_eq!(record.verification_keys, vec![added.encode_private().unwrap()]);
}

#[test]
fn update_surfaces_directory_rejection_with_stage_and_body() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", Matcher::Regex(r"^/did:plc:".to_string()))
        .with_status(200)
        .create();

    let store = MemoryStore::new();
    let config = config_for(&server);
    let mut did = Did::create(&store, &config).unwrap();

    mock_tail_matching(&mut server, &did, &config);
    server
        .mock("POST", format!("/{}", did.id()).as_str())
        .with_status(409)
        .with_body("operation conflicts with log tail")
        .create();

    did.generate_verification_key().unwrap();
    let err = did.update().unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("submit"), "stage missing: {rendered}");
    assert!(rendered.contains("conflicts with log tail"), "body missing: {rendered}");

    // The local draft is untouched by the failure; retry is the
    // caller's call.
    assert_eq!(did.verification_keys().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Audit log & publication status
// ---------------------------------------------------------------------------

#[test]
fn audit_log_parses_full_history() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", Matcher::Regex(r"^/did:plc:".to_string()))
        .with_status(200)
        .create();

    let store = MemoryStore::new();
    let config = config_for(&server);
    let did = Did::create(&store, &config).unwrap();

    let rotation = did.rotation_keys().unwrap()[0].encode_did_key();
    let entry = json!({
        "type": "plc_operation",
        "rotationKeys": [rotation],
        "verificationMethods": {},
        "alsoKnownAs": [],
        "services": {},
        "prev": null,
        "sig": "c2ln"
    });
    server
        .mock("GET", format!("/{}/log/audit", did.id()).as_str())
        .with_status(200)
        .with_body(json!([entry, entry]).to_string())
        .create();

    let log: Vec<WireOperation> = did.fetch_audit_log().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].op_type, "plc_operation");
    assert!(log[0].prev.is_none());
}

#[test]
fn publication_status_reflects_directory_answers() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", Matcher::Regex(r"^/did:plc:".to_string()))
        .with_status(200)
        .create();

    let store = MemoryStore::new();
    let config = config_for(&server);
    let did = Did::create(&store, &config).unwrap();

    let status = server
        .mock("GET", format!("/{}", did.id()).as_str())
        .with_status(200)
        .create();
    assert_eq!(
        did.is_published().unwrap(),
        fair_plc::PublicationStatus::Published
    );
    status.assert();
}

// ---------------------------------------------------------------------------
// Artifact signing
// ---------------------------------------------------------------------------

#[test]
fn artifact_signature_for_hello_verifies_under_ed25519() {
    let key = fixed_ed25519_key();
    let sig = artifact::sign_artifact(&key, b"hello").unwrap();

    // Standard Ed25519 verification of the SHA-384 digest, using only
    // the public half reconstructed from the multibase encoding.
    let public = Key::from_public(&key.encode_public()).unwrap();
    let raw = base64url_decode(&sig).unwrap();
    let digest = <sha2::Sha384 as sha2::Digest>::digest(b"hello");
    assert!(public.verify(&digest, &raw));

    assert_eq!(
        artifact::content_hash(b"hello"),
        "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
}

#[test]
fn newest_verification_key_signs_artifacts() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", Matcher::Regex(r"^/did:plc:".to_string()))
        .with_status(200)
        .create();

    let store = MemoryStore::new();
    let mut did = Did::create(&store, &config_for(&server)).unwrap();
    let newest = did.generate_verification_key().unwrap();

    let signer = did.artifact_signing_key().unwrap();
    assert_eq!(signer, newest);

    let meta = artifact::artifact_metadata(&signer, b"release-1.2.3").unwrap();
    assert!(artifact::verify_artifact(&newest, b"release-1.2.3", &meta.signature));
}

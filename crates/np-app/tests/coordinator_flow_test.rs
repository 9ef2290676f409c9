mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use np_app::{CoordinatorError, PreferencesEvent, PrefsController};
use np_core::encryption::{
    EncryptionError, EncryptionMismatch, EncryptionPhase, EncryptionState, MismatchKind,
    MismatchResolution,
};
use np_core::storage::{QueueDecision, StorageFormat};
use np_core::{SecretString, VerificationStatus};

use support::{build, idle_verifier, MockVerifier};

const PASSPHRASE_ACCOUNT: &str = "notes-passphrase";

fn encryption_error(err: CoordinatorError) -> EncryptionError {
    match err {
        CoordinatorError::Encryption(err) => err,
        other => panic!("expected an encryption error, got {other:?}"),
    }
}

#[tokio::test]
async fn enable_then_disable_requires_confirmation_and_clears_secret() {
    let mut h = build(
        EncryptionState::Disabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;

    let phase = h
        .coordinator
        .enable_encryption(SecretString::from("pw123"))
        .await
        .expect("enable");
    assert_eq!(phase, EncryptionPhase::Enabled);
    assert_eq!(h.credentials.get(PASSPHRASE_ACCOUNT).as_deref(), Some("pw123"));
    assert_eq!(h.store.metadata().encryption, EncryptionState::Enabled);

    let err = h.coordinator.disable_encryption(false).await.unwrap_err();
    assert_eq!(encryption_error(err), EncryptionError::ConfirmationRequired);
    assert_eq!(h.coordinator.encryption_phase().await, EncryptionPhase::Enabled);
    assert!(h.credentials.get(PASSPHRASE_ACCOUNT).is_some());

    let phase = h.coordinator.disable_encryption(true).await.expect("disable");
    assert_eq!(phase, EncryptionPhase::Disabled);
    assert!(h.credentials.get(PASSPHRASE_ACCOUNT).is_none());
    assert_eq!(h.store.metadata().encryption, EncryptionState::Disabled);
    assert_eq!(*h.store.rewrites.lock().unwrap(), 1);

    let phases: Vec<_> = h
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            PreferencesEvent::EncryptionStateChanged { phase } => Some(phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            EncryptionPhase::EnablingPending,
            EncryptionPhase::Enabled,
            EncryptionPhase::DisablingPending,
            EncryptionPhase::Disabled,
        ]
    );
}

#[tokio::test]
async fn wrong_old_passphrase_never_touches_stored_secret() {
    let h = build(
        EncryptionState::Disabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;
    h.coordinator
        .enable_encryption(SecretString::from("original"))
        .await
        .expect("enable");

    let err = h
        .coordinator
        .change_passphrase(SecretString::from("guess"), SecretString::from("next"))
        .await
        .unwrap_err();

    assert_eq!(encryption_error(err), EncryptionError::InvalidCredential);
    assert_eq!(
        h.credentials.get(PASSPHRASE_ACCOUNT).as_deref(),
        Some("original")
    );
    assert_eq!(h.coordinator.encryption_phase().await, EncryptionPhase::Enabled);
}

#[tokio::test]
async fn credential_store_failure_leaves_encryption_disabled() {
    let mut h = build(
        EncryptionState::Disabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;
    h.credentials.fail_save.store(true, Ordering::SeqCst);

    let err = h
        .coordinator
        .enable_encryption(SecretString::from("pw"))
        .await
        .unwrap_err();

    assert!(matches!(
        encryption_error(err),
        EncryptionError::CredentialStore(_)
    ));
    assert_eq!(h.coordinator.encryption_phase().await, EncryptionPhase::Disabled);
    assert_eq!(h.store.metadata().encryption, EncryptionState::Disabled);
    assert!(h
        .drain_events()
        .iter()
        .any(|event| matches!(event, PreferencesEvent::EncryptionError { .. })));
}

#[tokio::test]
async fn enabling_is_refused_for_separate_file_formats() {
    let h = build(
        EncryptionState::Disabled,
        StorageFormat::PlainText,
        idle_verifier(),
    )
    .await;

    let err = h
        .coordinator
        .enable_encryption(SecretString::from("pw"))
        .await
        .unwrap_err();

    assert_eq!(
        encryption_error(err),
        EncryptionError::FormatUnsupported(StorageFormat::PlainText)
    );
    assert_eq!(h.coordinator.encryption_phase().await, EncryptionPhase::Disabled);
    assert!(h.credentials.get(PASSPHRASE_ACCOUNT).is_none());
}

#[tokio::test(start_paused = true)]
async fn enabling_is_refused_while_conversion_to_plaintext_is_queued() {
    let h = build(
        EncryptionState::Disabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;

    h.coordinator
        .request_format_change(StorageFormat::Html)
        .await
        .expect("request");
    let err = h
        .coordinator
        .begin_enable_encryption()
        .await
        .unwrap_err();

    assert_eq!(
        encryption_error(err),
        EncryptionError::FormatUnsupported(StorageFormat::Html)
    );
    h.coordinator.wait_for_format_idle().await;
}

#[tokio::test(start_paused = true)]
async fn unsupported_format_while_encrypted_is_held_until_disabled() {
    let mut h = build(
        EncryptionState::Disabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;
    h.coordinator
        .enable_encryption(SecretString::from("pw"))
        .await
        .expect("enable");
    h.drain_events();

    let decision = h
        .coordinator
        .request_format_change(StorageFormat::PlainText)
        .await
        .expect("request");
    assert_eq!(decision, QueueDecision::Held { replaced: None });
    assert_eq!(
        h.coordinator.pending_mismatch().await,
        Some(EncryptionMismatch::unsupported_format(StorageFormat::PlainText))
    );
    assert!(h.drain_events().iter().any(|event| matches!(
        event,
        PreferencesEvent::EncryptionMismatch { mismatch }
            if mismatch.kind == MismatchKind::UnsupportedFormat { requested: StorageFormat::PlainText }
    )));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(h.converter.calls().is_empty());

    let phase = h
        .coordinator
        .resolve_mismatch(MismatchResolution::DisableEncryption)
        .await
        .expect("resolve");
    assert_eq!(phase, EncryptionPhase::Disabled);
    assert!(h.credentials.get(PASSPHRASE_ACCOUNT).is_none());

    h.coordinator.wait_for_format_idle().await;
    assert_eq!(
        h.converter.calls(),
        vec![(StorageFormat::SingleDatabase, StorageFormat::PlainText)]
    );
    assert_eq!(h.coordinator.storage_format().await, StorageFormat::PlainText);
    assert_eq!(h.store.metadata().format, StorageFormat::PlainText);
    assert!(h.coordinator.pending_mismatch().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn keeping_encryption_discards_the_held_change() {
    let h = build(
        EncryptionState::Enabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;
    h.credentials
        .items
        .lock()
        .unwrap()
        .insert(PASSPHRASE_ACCOUNT.to_string(), "pw".to_string());

    h.coordinator
        .request_format_change(StorageFormat::RichText)
        .await
        .expect("request");
    let phase = h
        .coordinator
        .resolve_mismatch(MismatchResolution::KeepEncryption)
        .await
        .expect("resolve");

    assert_eq!(phase, EncryptionPhase::Enabled);
    h.coordinator.wait_for_format_idle().await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(h.converter.calls().is_empty());
    assert_eq!(h.coordinator.storage_format().await, StorageFormat::SingleDatabase);
    assert!(h.credentials.get(PASSPHRASE_ACCOUNT).is_some());
}

#[tokio::test(start_paused = true)]
async fn failed_resolution_keeps_the_queue_held() {
    let h = build(
        EncryptionState::Enabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;
    h.store.fail_rewrite.store(true, Ordering::SeqCst);

    h.coordinator
        .request_format_change(StorageFormat::WordDocument)
        .await
        .expect("request");
    let err = h
        .coordinator
        .resolve_mismatch(MismatchResolution::DisableEncryption)
        .await
        .unwrap_err();

    assert!(matches!(
        encryption_error(err),
        EncryptionError::StorageRewriteFailed(_)
    ));
    assert_eq!(h.coordinator.encryption_phase().await, EncryptionPhase::Enabled);
    assert!(h.coordinator.pending_mismatch().await.is_some());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(h.converter.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unsaved_disabled_marker_holds_the_queue_until_rewritten() {
    let mut h = build(
        EncryptionState::Enabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;
    h.credentials
        .items
        .lock()
        .unwrap()
        .insert(PASSPHRASE_ACCOUNT.to_string(), "pw".to_string());
    h.store.fail_marker.store(true, Ordering::SeqCst);

    let err = h.coordinator.disable_encryption(true).await.unwrap_err();

    assert!(matches!(
        encryption_error(err),
        EncryptionError::MetadataWriteFailed(_)
    ));
    assert_eq!(h.coordinator.encryption_phase().await, EncryptionPhase::Disabled);
    assert_eq!(*h.store.rewrites.lock().unwrap(), 1);
    assert_eq!(h.store.metadata().encryption, EncryptionState::Enabled);
    assert!(h.credentials.get(PASSPHRASE_ACCOUNT).is_none());
    assert_eq!(
        h.coordinator.pending_mismatch().await,
        Some(EncryptionMismatch::store_reported(
            EncryptionState::Disabled,
            EncryptionState::Enabled
        ))
    );
    assert!(h.drain_events().iter().any(|event| matches!(
        event,
        PreferencesEvent::EncryptionMismatch { mismatch }
            if mismatch.kind == MismatchKind::StoreReported { on_disk: EncryptionState::Enabled }
    )));

    let decision = h
        .coordinator
        .request_format_change(StorageFormat::PlainText)
        .await
        .expect("request");
    assert!(matches!(decision, QueueDecision::Held { .. }));

    h.store.fail_marker.store(false, Ordering::SeqCst);
    h.coordinator
        .resolve_mismatch(MismatchResolution::DisableEncryption)
        .await
        .expect("resolve");

    assert_eq!(h.store.metadata().encryption, EncryptionState::Disabled);
    assert!(h.coordinator.pending_mismatch().await.is_none());
    h.coordinator.wait_for_format_idle().await;
    assert_eq!(h.coordinator.storage_format().await, StorageFormat::PlainText);
}

#[tokio::test(start_paused = true)]
async fn store_reported_encryption_is_rewritten_when_disabling() {
    let h = build(
        EncryptionState::Disabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;

    assert_eq!(
        h.coordinator
            .report_store_mismatch(EncryptionState::Disabled)
            .await
            .expect("report"),
        None
    );
    let mismatch = h
        .coordinator
        .report_store_mismatch(EncryptionState::Enabled)
        .await
        .expect("report")
        .expect("mismatch recorded");
    assert_eq!(mismatch.advertised, EncryptionState::Disabled);

    // Parked behind the mismatch.
    let decision = h
        .coordinator
        .request_format_change(StorageFormat::Html)
        .await
        .expect("request");
    assert!(matches!(decision, QueueDecision::Held { .. }));

    h.coordinator
        .resolve_mismatch(MismatchResolution::DisableEncryption)
        .await
        .expect("resolve");
    assert_eq!(*h.store.rewrites.lock().unwrap(), 1);

    h.coordinator.wait_for_format_idle().await;
    assert_eq!(h.coordinator.storage_format().await, StorageFormat::Html);
}

#[tokio::test]
async fn resolving_without_a_mismatch_is_an_error() {
    let h = build(
        EncryptionState::Disabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;

    let err = h
        .coordinator
        .resolve_mismatch(MismatchResolution::KeepEncryption)
        .await
        .unwrap_err();
    assert_eq!(encryption_error(err), EncryptionError::NoPendingMismatch);
}

#[tokio::test]
async fn encrypted_store_in_plaintext_format_starts_with_a_mismatch() {
    let h = build(
        EncryptionState::Enabled,
        StorageFormat::PlainText,
        idle_verifier(),
    )
    .await;

    assert_eq!(
        h.coordinator.pending_mismatch().await,
        Some(EncryptionMismatch::unsupported_format(StorageFormat::PlainText))
    );
}

#[tokio::test(start_paused = true)]
async fn committed_sync_login_is_stored_and_verified() {
    let mut verifier = MockVerifier::new();
    verifier
        .expect_verify()
        .withf(|account, secret| account == "me@example.com" && secret.expose() == "s3cret")
        .times(1)
        .returning(|_, _| Ok(true));
    let h = build(
        EncryptionState::Enabled,
        StorageFormat::SingleDatabase,
        Arc::new(verifier),
    )
    .await;

    let prefs = h
        .coordinator
        .commit_sync_credentials("me@example.com", SecretString::from("s3cret"))
        .await
        .expect("commit");
    assert_eq!(prefs.sync.account.as_deref(), Some("me@example.com"));
    assert_eq!(
        h.credentials.get("sync:me@example.com").as_deref(),
        Some("s3cret")
    );

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(
        h.coordinator.verification_status().await,
        VerificationStatus::Valid
    );

    let prefs = h.coordinator.remove_sync_credentials().await.expect("remove");
    assert!(prefs.sync.account.is_none());
    assert!(h.credentials.get("sync:me@example.com").is_none());
    assert_eq!(
        h.coordinator.verification_status().await,
        VerificationStatus::Unknown
    );
}

#[tokio::test]
async fn sync_alert_shows_only_when_syncing_encrypted_notes() {
    let h = build(
        EncryptionState::Enabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;
    let controller = PrefsController::new(h.coordinator.clone());

    assert!(!h.coordinator.sync_encryption_alert().await.expect("alert"));
    controller.toggled_syncing(true).await.expect("toggle");
    assert!(h.coordinator.sync_encryption_alert().await.expect("alert"));

    let state = controller.controls_state().await.expect("state");
    assert!(state.sync_encryption_alert_visible);
    assert!(state.change_passphrase_enabled);
    assert!(!state.separate_file_controls_enabled);
}

#[tokio::test]
async fn controller_passphrase_picker_round_trip() {
    let h = build(
        EncryptionState::Disabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;
    let controller = PrefsController::new(h.coordinator.clone());

    let phase = controller.toggled_encryption(true).await.expect("check");
    assert_eq!(phase, EncryptionPhase::EnablingPending);
    assert!(controller.controls_state().await.expect("state").encryption_checked);

    let phase = controller.passphrase_picker_cancelled().await.expect("cancel");
    assert_eq!(phase, EncryptionPhase::Disabled);

    controller.toggled_encryption(true).await.expect("check");
    let phase = controller
        .passphrase_picked("pw".to_string())
        .await
        .expect("pick");
    assert_eq!(phase, EncryptionPhase::Enabled);

    let err = controller.toggled_encryption(false).await.unwrap_err();
    assert_eq!(
        err.as_encryption(),
        Some(&EncryptionError::ConfirmationRequired)
    );
    let phase = controller
        .confirmed_disable_encryption()
        .await
        .expect("confirm");
    assert_eq!(phase, EncryptionPhase::Disabled);
}

#[tokio::test]
async fn controller_rejects_unknown_popup_indices_and_bad_edits() {
    let h = build(
        EncryptionState::Disabled,
        StorageFormat::SingleDatabase,
        idle_verifier(),
    )
    .await;
    let controller = PrefsController::new(h.coordinator.clone());

    assert!(matches!(
        controller.changed_file_storage_format(42).await,
        Err(CoordinatorError::InvalidSelection { index: 42, .. })
    ));
    assert!(matches!(
        controller.sync_frequency_changed(9).await,
        Err(CoordinatorError::InvalidSelection { index: 9, .. })
    ));
    assert!(matches!(
        controller.changed_key_length(100).await,
        Err(CoordinatorError::Preferences(_))
    ));

    let prefs = controller.added_extension(".Markdown".into()).await.expect("add");
    assert!(prefs.allowed_extensions.contains(&"markdown".to_string()));
    assert_eq!(
        h.preferences.prefs.lock().unwrap().allowed_extensions,
        prefs.allowed_extensions
    );
}

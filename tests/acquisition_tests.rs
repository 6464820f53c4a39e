// Integration tests for stream acquisition
//
// These run the acquirer against the simulated capture backend and check
// which tracks end up in the composed set, which requests were made, and
// that nothing is left live after a failure.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use web_recorder::capture::{
    AcquisitionWarning, AudioMode, CaptureConfig, CaptureError, SourceSelector, StreamAcquirer,
    TrackRole,
};
use web_recorder::error::{AcquisitionError, ErrorKind};
use web_recorder::sim::{CaptureRequest, CaptureScript, SimulatedCapture};

fn acquirer(script: CaptureScript) -> (Arc<SimulatedCapture>, StreamAcquirer) {
    let capture = Arc::new(SimulatedCapture::new(script));
    let acquirer = StreamAcquirer::new(capture.clone(), CaptureConfig::default());
    (capture, acquirer)
}

#[tokio::test]
async fn test_screen_with_both_audio_sources() -> Result<()> {
    let (capture, acquirer) = acquirer(CaptureScript::default());

    let acquired = acquirer.acquire(SourceSelector::Screen, AudioMode::Both).await?;

    assert_eq!(
        acquired.tracks.roles(),
        vec![TrackRole::Video, TrackRole::SystemAudio, TrackRole::MicAudio]
    );
    assert!(acquired.warnings.is_empty());
    assert_eq!(capture.live_tracks().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_video_is_first_even_when_audio_arrives_first() -> Result<()> {
    let (_capture, acquirer) = acquirer(CaptureScript {
        audio_first: true,
        ..Default::default()
    });

    let acquired = acquirer
        .acquire(SourceSelector::Tab, AudioMode::SystemOnly)
        .await?;

    assert_eq!(acquired.tracks.roles(), vec![TrackRole::Video, TrackRole::SystemAudio]);
    assert!(acquired.tracks.has_video());
    Ok(())
}

#[tokio::test]
async fn test_display_audio_refused_falls_back_to_video_only() -> Result<()> {
    let (capture, acquirer) = acquirer(CaptureScript {
        display_audio_error: Some(CaptureError::NotSupported("no system audio".to_string())),
        ..Default::default()
    });

    let acquired = acquirer
        .acquire(SourceSelector::Screen, AudioMode::SystemOnly)
        .await?;

    assert_eq!(acquired.tracks.roles(), vec![TrackRole::Video]);
    assert_eq!(acquired.warnings.len(), 1);
    assert!(matches!(
        acquired.warnings[0],
        AcquisitionWarning::DisplayAudioUnavailable(_)
    ));

    // First request asked for audio, the retry did not
    let requests = capture.requests();
    assert_eq!(requests.len(), 2);
    match (&requests[0], &requests[1]) {
        (CaptureRequest::Display(first), CaptureRequest::Display(retry)) => {
            assert!(first.audio);
            assert!(!retry.audio);
        }
        other => panic!("unexpected requests: {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_display_denied_without_audio_is_not_retried() -> Result<()> {
    let (capture, acquirer) = acquirer(CaptureScript {
        display_error: Some(CaptureError::NotAllowed("user dismissed picker".to_string())),
        ..Default::default()
    });

    let err = acquirer
        .acquire(SourceSelector::Screen, AudioMode::None)
        .await
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::DisplayCaptureDenied(_)));
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert_eq!(capture.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_display_denied_on_retry_reports_denial() -> Result<()> {
    let (capture, acquirer) = acquirer(CaptureScript {
        display_error: Some(CaptureError::NotAllowed("user dismissed picker".to_string())),
        ..Default::default()
    });

    let err = acquirer
        .acquire(SourceSelector::Tab, AudioMode::Both)
        .await
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::DisplayCaptureDenied(_)));
    assert_eq!(capture.requests().len(), 2);
    assert!(capture.live_tracks().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_mic_only_denied_releases_video() -> Result<()> {
    let (capture, acquirer) = acquirer(CaptureScript {
        mic_error: Some(CaptureError::NotAllowed("microphone blocked".to_string())),
        ..Default::default()
    });

    let err = acquirer
        .acquire(SourceSelector::Camera, AudioMode::MicOnly)
        .await
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::MicDenied(_)));
    assert!(capture.live_tracks().is_empty(), "camera track must be released");
    assert_eq!(capture.released_tracks().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_mic_denied_with_both_continues_with_warning() -> Result<()> {
    let (_capture, acquirer) = acquirer(CaptureScript {
        mic_error: Some(CaptureError::NotAllowed("microphone blocked".to_string())),
        ..Default::default()
    });

    let acquired = acquirer.acquire(SourceSelector::Screen, AudioMode::Both).await?;

    assert_eq!(acquired.tracks.roles(), vec![TrackRole::Video, TrackRole::SystemAudio]);
    assert!(matches!(
        acquired.warnings.as_slice(),
        [AcquisitionWarning::MicUnavailable(_)]
    ));
    Ok(())
}

#[tokio::test]
async fn test_display_without_video_is_empty_stream() -> Result<()> {
    let (capture, acquirer) = acquirer(CaptureScript {
        display_without_video: true,
        ..Default::default()
    });

    let err = acquirer
        .acquire(SourceSelector::Screen, AudioMode::SystemOnly)
        .await
        .unwrap_err();

    assert_eq!(err, AcquisitionError::EmptyStream);
    assert!(capture.live_tracks().is_empty(), "system audio must be released");
    Ok(())
}

#[tokio::test]
async fn test_camera_errors_map_to_kinds() -> Result<()> {
    let cases = vec![
        (CaptureError::NotAllowed("x".to_string()), ErrorKind::PermissionDenied),
        (CaptureError::NotFound("x".to_string()), ErrorKind::NoDevice),
        (CaptureError::Overconstrained("x".to_string()), ErrorKind::ConstraintUnsatisfiable),
        (CaptureError::NotSupported("x".to_string()), ErrorKind::Unsupported),
    ];

    for (cause, kind) in cases {
        let (_capture, acquirer) = acquirer(CaptureScript {
            camera_error: Some(cause),
            ..Default::default()
        });

        let err = acquirer
            .acquire(SourceSelector::Camera, AudioMode::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), kind);
    }
    Ok(())
}

#[tokio::test]
async fn test_no_audio_requests_nothing_extra() -> Result<()> {
    let (capture, acquirer) = acquirer(CaptureScript::default());

    let acquired = acquirer.acquire(SourceSelector::Camera, AudioMode::None).await?;

    assert_eq!(acquired.tracks.roles(), vec![TrackRole::Video]);
    assert_eq!(capture.requests().len(), 1);

    acquirer.release(&acquired.tracks);
    assert!(capture.live_tracks().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_role_order_for_every_source_and_audio_mode() -> Result<()> {
    let sources = [SourceSelector::Screen, SourceSelector::Camera, SourceSelector::Tab];
    let modes = [
        AudioMode::None,
        AudioMode::SystemOnly,
        AudioMode::MicOnly,
        AudioMode::Both,
    ];

    for source in sources {
        for audio_mode in modes {
            let (_capture, acquirer) = acquirer(CaptureScript::default());
            let roles = acquirer.acquire(source, audio_mode).await?.tracks.roles();
            let case = format!("{} / {}", source, audio_mode);

            let mut expected = vec![TrackRole::Video];
            if audio_mode.wants_system_audio() && source != SourceSelector::Camera {
                expected.push(TrackRole::SystemAudio);
            }
            if audio_mode.wants_mic() {
                expected.push(TrackRole::MicAudio);
            }
            assert_eq!(roles, expected, "{}", case);

            for role in [TrackRole::SystemAudio, TrackRole::MicAudio] {
                let count = roles.iter().filter(|r| **r == role).count();
                assert!(count <= 1, "{}: {:?} appears {} times", case, role, count);
            }
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_dropped_acquisition_releases_held_tracks() -> Result<()> {
    let (capture, acquirer) = acquirer(CaptureScript {
        mic_delay: Some(Duration::from_millis(500)),
        ..Default::default()
    });

    // The display tracks are in hand while the microphone is still pending
    let result = tokio::time::timeout(
        Duration::from_millis(50),
        acquirer.acquire(SourceSelector::Screen, AudioMode::Both),
    )
    .await;

    assert!(result.is_err());
    assert!(capture.live_tracks().is_empty());
    assert_eq!(capture.released_tracks(), vec!["track-1", "track-2"]);
    Ok(())
}
